use {
    anyhow::Result,
    candle_core::Device,
    ddpg_ig::{
        agents::{
            networks::{
                Actor,
                Critic,
            },
            OffPolicyAlgorithm,
            RunMode,
            DDPG,
        },
        configs::{
            DDPG_Config,
            TrainConfig,
        },
        engines::{
            loop_off_policy,
            run_experiment_off_policy,
            Checkpointing,
        },
        envs::{
            Environment,
            ReachConfig,
            ReachEnv,
        },
        util::read_config,
    },
};

fn env_config() -> ReachConfig {
    ReachConfig {
        size_state: 8,
        size_action: 2,
        timelimit: 10,
        ..Default::default()
    }
}

fn alg_config() -> DDPG_Config {
    DDPG_Config {
        hidden_1_size: 8,
        hidden_2_size: 8,
        replay_buffer_capacity: 200,
        replay_start_size: 8,
        training_batch_size: 4,
        ..DDPG_Config::reach(2)
    }
}

#[test]
fn test_training_loop_fills_the_buffer() -> Result<()> {
    let device = Device::Cpu;
    let dir = tempfile::tempdir()?;
    let mut env = *ReachEnv::new(env_config())?;
    let mut alg = DDPG::from_config(&device, &alg_config(), 8, 2)?;
    let config = TrainConfig::new(3, 2, Some(2));

    let (returns, successes) = loop_off_policy(
        &mut env,
        &mut alg,
        &config,
        RunMode::Train,
        Some(Checkpointing { dir: dir.path(), name: "loop" }),
        &device,
    )?;
    assert_eq!(returns.len(), 3);
    assert_eq!(successes.len(), 3);
    assert!(alg.replay_buffer().len() >= 3);
    assert!(alg.replay_buffer().len() <= 30);
    assert!(alg.train_steps() > 0 || alg.replay_buffer().len() <= 8);
    assert!(dir.path().join("loop-episode_2-actor.safetensors").exists());
    assert!(!dir.path().join("loop-episode_3-actor.safetensors").exists());

    // evaluation learns nothing
    let stored = alg.replay_buffer().len();
    let (returns, _) = loop_off_policy(&mut env, &mut alg, &config, RunMode::Test, None, &device)?;
    assert_eq!(returns.len(), 2);
    assert_eq!(alg.replay_buffer().len(), stored);
    Ok(())
}

#[test]
fn test_experiment_writes_configs_results_and_weights() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("reach");

    run_experiment_off_policy::<DDPG<Actor, Critic>, ReachEnv, _, _, _>(
        &path,
        2,
        env_config(),
        alg_config(),
        TrainConfig::new(2, 1, None),
        DDPG::from_config,
        None,
        &Device::Cpu,
    )?;

    assert_eq!(read_config::<DDPG_Config, _>(path.join("config_algorithm.ron"))?, alg_config());
    assert_eq!(read_config::<ReachConfig, _>(path.join("config_environment.ron"))?, env_config());
    for n in 0..2 {
        assert!(path.join(format!("run_{n}_train.parquet")).exists());
        assert!(path.join(format!("run_{n}_test.parquet")).exists());
        assert!(path.join(format!("run_{n}-actor.safetensors")).exists());
        assert!(path.join(format!("run_{n}-critic.safetensors")).exists());
    }
    Ok(())
}

#[test]
fn test_experiment_refuses_to_overwrite() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let run = || {
        run_experiment_off_policy::<DDPG<Actor, Critic>, ReachEnv, _, _, _>(
            &dir.path(),
            0,
            env_config(),
            alg_config(),
            TrainConfig::new(1, 1, None),
            DDPG::from_config,
            None,
            &Device::Cpu,
        )
    };
    run()?;
    assert!(run().is_err());
    Ok(())
}
