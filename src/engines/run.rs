use {
    crate::{
        agents::{
            Algorithm,
            OffPolicyAlgorithm,
            RunMode,
            SaveableAlgorithm,
        },
        configs::TrainConfig,
        envs::{
            Environment,
            TensorConvertible,
        },
    },
    anyhow::Result,
    candle_core::Device,
    rand::Rng,
    std::path::Path,
    tracing::{
        info,
        warn,
    },
};


/// Where and under which name periodic checkpoints are written.
#[derive(Clone, Copy, Debug)]
pub struct Checkpointing<'a> {
    pub dir: &'a Path,
    pub name: &'a str,
}

/// Run episodes of an off-policy algorithm on an environment.
///
/// In [`RunMode::Train`] the agent explores with noise, perceives every
/// transition and runs `config.max_episodes()` episodes. Transitions cut off
/// by the time limit are stored as non-terminal and end the episode through
/// [`OffPolicyAlgorithm::end_episode`]. In [`RunMode::Test`] the agent acts
/// greedily for `config.test_episodes()` episodes and learns nothing.
///
/// Returns the total reward and whether the goal was reached, per episode.
///
/// # Arguments
///
/// * `env` - The environment to run on.
/// * `alg` - The agent to run.
/// * `config` - The configuration for the run.
/// * `mode` - Train or evaluate.
/// * `checkpointing` - Where to save checkpoints while training, if at all.
/// * `device` - The device to run on.
pub fn loop_off_policy<Alg, Env, Obs, Act>(
    env: &mut Env,
    alg: &mut Alg,
    config: &TrainConfig,
    mode: RunMode,
    checkpointing: Option<Checkpointing>,
    device: &Device,
) -> Result<(Vec<f64>, Vec<bool>)>
where
    Env: Environment<Action = Act, Observation = Obs>,
    Alg: Algorithm + OffPolicyAlgorithm + SaveableAlgorithm,
    Obs: TensorConvertible,
    Act: TensorConvertible,
{
    info!("action space: {:?}", env.action_space());
    info!("observation space: {:?}", env.observation_space());

    let n_episodes = match mode {
        RunMode::Train => config.max_episodes(),
        RunMode::Test => config.test_episodes(),
    };
    let mut mc_returns = Vec::with_capacity(n_episodes);
    let mut successes = Vec::with_capacity(n_episodes);
    let mut rng = rand::thread_rng();

    for episode in 0..n_episodes {
        let mut total_reward = 0.0;
        let mut steps = 0;
        env.reset(rng.gen::<u64>())?;

        let success = loop {
            let state = <Obs>::to_tensor(env.current_observation(), device)?;
            let action = alg.actions(&state, mode)?;

            let step = env.step(<Act>::from_tensor(action.clone())?)?;
            total_reward += step.reward;
            steps += 1;

            if let RunMode::Train = mode {
                alg.perceive(
                    &state,
                    &action,
                    step.reward,
                    &<Obs>::to_tensor(step.observation, device)?,
                    step.terminated,
                )?;
                if step.truncated {
                    alg.end_episode()?;
                }
            }

            if step.terminated || step.truncated {
                break step.terminated;
            }
        };

        warn!("{mode} episode {episode} took {steps} steps with total reward of {total_reward}");
        mc_returns.push(total_reward);
        successes.push(success);

        if let (RunMode::Train, Some(checkpointing)) = (mode, checkpointing) {
            if config.checkpoint_due(episode) {
                alg.save(
                    checkpointing.dir,
                    &format!("{}-episode_{}", checkpointing.name, episode + 1),
                )?;
            }
        }
    }
    Ok((mc_returns, successes))
}
