use {
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    ddpg_ig::{
        agents::{
            SaveableAlgorithm,
            DDPG,
        },
        configs::DDPG_Config,
    },
};

const SIZE_STATE: usize = 8;
const SIZE_ACTION: usize = 2;

fn config() -> DDPG_Config {
    DDPG_Config {
        hidden_1_size: 16,
        hidden_2_size: 16,
        replay_buffer_capacity: 64,
        replay_start_size: 8,
        training_batch_size: 4,
        ..DDPG_Config::reach(SIZE_ACTION)
    }
}

fn states() -> Result<Vec<Tensor>> {
    let mut states = Vec::new();
    for _ in 0..5 {
        states.push(Tensor::rand(0.0f64, 1.0, SIZE_STATE, &Device::Cpu)?);
    }
    Ok(states)
}

fn to_vec(t: &Tensor) -> Result<Vec<f64>> {
    Ok(t.to_vec1::<f64>()?)
}

#[test]
fn test_checkpoint_restores_the_policy() -> Result<()> {
    let device = Device::Cpu;
    let dir = tempfile::tempdir()?;
    let trained = DDPG::from_config(&device, &config(), SIZE_STATE, SIZE_ACTION)?;
    let mut fresh = DDPG::from_config(&device, &config(), SIZE_STATE, SIZE_ACTION)?;

    let states = states()?;
    let differs = states.iter().any(|s| {
        to_vec(&trained.action(s).unwrap()).unwrap() != to_vec(&fresh.action(s).unwrap()).unwrap()
    });
    assert!(differs, "independently initialised agents should act differently");

    trained.save(dir.path(), "agent")?;
    assert!(dir.path().join("agent-actor.safetensors").exists());
    assert!(dir.path().join("agent-critic.safetensors").exists());

    fresh.load(dir.path(), "agent")?;
    for s in &states {
        assert_eq!(to_vec(&trained.action(s)?)?, to_vec(&fresh.action(s)?)?);
    }
    Ok(())
}

#[test]
fn test_checkpoint_survives_training() -> Result<()> {
    let device = Device::Cpu;
    let dir = tempfile::tempdir()?;
    let mut trained = DDPG::from_config(&device, &config(), SIZE_STATE, SIZE_ACTION)?;

    let action = Tensor::new(&[0.5f64, 0.5], &device)?;
    for i in 0..12 {
        let s = Tensor::rand(0.0f64, 1.0, SIZE_STATE, &device)?;
        let s2 = Tensor::rand(0.0f64, 1.0, SIZE_STATE, &device)?;
        trained.perceive(&s, &action, -(i as f64), &s2, i % 5 == 4)?;
    }
    assert!(trained.train_steps() > 0);

    trained.save(dir.path(), "trained")?;
    let mut restored = DDPG::from_config(&device, &config(), SIZE_STATE, SIZE_ACTION)?;
    restored.load(dir.path(), "trained")?;

    for s in &states()? {
        assert_eq!(to_vec(&trained.action(s)?)?, to_vec(&restored.action(s)?)?);
    }
    Ok(())
}

#[test]
fn test_loading_a_missing_checkpoint_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut agent = DDPG::from_config(&Device::Cpu, &config(), SIZE_STATE, SIZE_ACTION)?;
    assert!(agent.load(dir.path(), "missing").is_err());
    Ok(())
}
