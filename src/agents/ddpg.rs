use {
    super::{
        networks::{
            Actor,
            Critic,
        },
        ActorFunction,
        Algorithm,
        CriticFunction,
        OffPolicyAlgorithm,
        RunMode,
        SaveableAlgorithm,
        SaveableNetwork,
        TrainingPhase,
    },
    crate::{
        components::{
            OuNoise,
            ReplayBuffer,
        },
        configs::DDPG_Config,
        error::DdpgError,
    },
    anyhow::Result,
    candle_core::{
        DType,
        Device,
        Tensor,
    },
    std::path::Path,
    tracing::{
        debug,
        info,
    },
};

/// Bootstrapped TD targets `y = r + gamma * q_next`, with `y = r` for
/// terminal transitions.
///
/// All inputs are `[n, 1]`, `dones` is a u8 mask. Terminal targets are
/// selected rather than computed as `r + gamma * q_next * 0`, so they never
/// depend on `q_next`, not even when it is NaN.
pub fn compute_targets(
    rewards: &Tensor,
    dones: &Tensor,
    q_next: &Tensor,
    gamma: f64,
) -> Result<Tensor> {
    let bootstrapped = (rewards + (gamma * q_next.detach())?)?;
    Ok(dones.where_cond(rewards, &bootstrapped)?)
}

fn ensure_finite(
    what: &'static str,
    tensor: &Tensor,
) -> Result<()> {
    let finite = tensor
        .flatten_all()?
        .to_dtype(DType::F64)?
        .to_vec1::<f64>()?
        .iter()
        .all(|x| x.is_finite());
    if !finite {
        Err(DdpgError::NumericalInstability { what })?
    }
    Ok(())
}

fn ensure_dims(
    what: &'static str,
    tensor: &Tensor,
    expected: &[usize],
) -> Result<()> {
    if tensor.dims() != expected {
        Err(DdpgError::DimensionMismatch {
            what,
            expected: expected.to_vec(),
            actual: tensor.dims().to_vec(),
        })?
    }
    Ok(())
}

/// Deep Deterministic Policy Gradient with inverting gradients.
///
/// The agent owns its actor and critic (each with a target copy), one replay
/// buffer and one exploration noise process. Every transition handed to
/// [`DDPG::perceive`] is stored, and once the buffer holds more than
/// `replay_start_size` transitions each of them also triggers one training
/// step.
#[allow(clippy::upper_case_acronyms)]
pub struct DDPG<A, C> {
    actor: A,
    critic: C,
    replay_buffer: ReplayBuffer,
    ou_noise: OuNoise,
    config: DDPG_Config,
    device: Device,

    size_state: usize,
    size_action: usize,
    phase: TrainingPhase,
    train_steps: usize,
}

impl DDPG<Actor, Critic> {
    /// Build the agent with the candle actor and critic.
    pub fn from_config(
        device: &Device,
        config: &DDPG_Config,
        size_state: usize,
        size_action: usize,
    ) -> Result<Self> {
        Self::new(
            Actor::from_config(device, config, size_state, size_action)?,
            Critic::from_config(device, config, size_state, size_action)?,
            config.clone(),
            size_state,
            size_action,
            device,
        )
    }
}

impl<A, C> DDPG<A, C>
where
    A: ActorFunction,
    C: CriticFunction,
{
    pub fn new(
        actor: A,
        critic: C,
        config: DDPG_Config,
        size_state: usize,
        size_action: usize,
        device: &Device,
    ) -> Result<Self> {
        config.validate(size_action)?;
        let ou_noise = OuNoise::new(
            config.ou_mu,
            config.ou_theta,
            config.ou_sigma,
            size_action,
            device,
        )?;
        info!(
            size_state,
            size_action,
            replay_start_size = config.replay_start_size,
            batch_size = config.training_batch_size,
            "created DDPG agent",
        );
        Ok(Self {
            actor,
            critic,
            replay_buffer: ReplayBuffer::new(config.replay_buffer_capacity),
            ou_noise,
            config,
            device: device.clone(),
            size_state,
            size_action,
            phase: TrainingPhase::Warmup,
            train_steps: 0,
        })
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    pub fn critic(&self) -> &C {
        &self.critic
    }

    pub fn noise(&self) -> &OuNoise {
        &self.ou_noise
    }

    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    /// Number of training steps performed so far.
    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    /// Greedy action, clipped into the action bounds.
    pub fn action(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        ensure_dims("state", state, &[self.size_state])?;
        let action = self.actor.action(state)?;
        self.config.action_bounds.clip(&action)
    }

    /// Exploration action: policy plus Ornstein-Uhlenbeck noise, clipped into
    /// the action bounds.
    pub fn noise_action(
        &mut self,
        state: &Tensor,
    ) -> Result<Tensor> {
        ensure_dims("state", state, &[self.size_state])?;
        let action = self.actor.action(state)?;
        let noise = self.ou_noise.sample()?.to_dtype(action.dtype())?;
        let noisy = (action + noise)?;
        self.config.action_bounds.clip(&noisy)
    }

    /// Store a transition, train if warmed up, and reset the exploration
    /// noise when the episode is done.
    pub fn perceive(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) -> Result<()> {
        ensure_dims("state", state, &[self.size_state])?;
        ensure_dims("action", action, &[self.size_action])?;
        ensure_dims("next state", next_state, &[self.size_state])?;

        self.replay_buffer
            .push(state, action, reward, next_state, done);

        if self.replay_buffer.len() > self.config.replay_start_size {
            if self.phase == TrainingPhase::Warmup {
                info!(
                    transitions = self.replay_buffer.len(),
                    "replay buffer warmed up, training starts",
                );
                self.phase = TrainingPhase::Active;
            }
            self.train()?;
        }

        if done {
            self.ou_noise.reset()?;
        }
        Ok(())
    }

    /// One training step on a uniformly sampled batch.
    pub fn train(&mut self) -> Result<()> {
        let batch = self.replay_buffer.random_batch(
            self.config.training_batch_size,
            self.size_action,
            &self.device,
        )?;

        // Bootstrapped targets from the target networks.
        let next_actions = self.actor.target_actions(&batch.next_states)?;
        let q_next = self.critic.target_q(&batch.next_states, &next_actions)?;
        let targets = compute_targets(
            &batch.rewards.to_dtype(q_next.dtype())?,
            &batch.dones,
            &q_next,
            self.config.gamma,
        )?;
        ensure_finite("TD targets", &targets)?;

        self.critic
            .train(&targets, &batch.states, &batch.actions)?;

        // Deterministic policy gradient dQ/da, shaped near the action bounds.
        let actions = self.actor.actions(&batch.states)?;
        let q_gradients = self.critic.gradients(&batch.states, &actions)?.neg()?;
        let q_gradients = self
            .config
            .action_bounds
            .invert_gradients(&q_gradients, &actions)?;
        ensure_finite("policy gradients", &q_gradients)?;

        self.actor.train(&q_gradients, &batch.states)?;

        self.actor.update_target()?;
        self.critic.update_target()?;

        self.train_steps += 1;
        debug!(train_steps = self.train_steps, "training step done");
        Ok(())
    }
}

impl<A, C> Algorithm for DDPG<A, C>
where
    A: ActorFunction,
    C: CriticFunction,
{
    type Config = DDPG_Config;

    fn config(&self) -> &DDPG_Config {
        &self.config
    }

    fn actions(
        &mut self,
        state: &Tensor,
        mode: RunMode,
    ) -> Result<Tensor> {
        match mode {
            RunMode::Train => self.noise_action(state),
            RunMode::Test => self.action(state),
        }
    }
}

impl<A, C> OffPolicyAlgorithm for DDPG<A, C>
where
    A: ActorFunction,
    C: CriticFunction,
{
    fn perceive(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) -> Result<()> {
        DDPG::perceive(self, state, action, reward, next_state, done)
    }

    fn end_episode(&mut self) -> Result<()> {
        Ok(self.ou_noise.reset()?)
    }

    fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_buffer
    }
}

impl<A, C> SaveableAlgorithm for DDPG<A, C>
where
    A: ActorFunction + SaveableNetwork,
    C: CriticFunction + SaveableNetwork,
{
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        dir: &P,
        name: &str,
    ) -> Result<()> {
        let dir = dir.as_ref();
        self.actor.save(&dir.join(format!("{name}-actor.safetensors")))?;
        self.critic.save(&dir.join(format!("{name}-critic.safetensors")))?;
        info!("saved checkpoint {name} to {}", dir.display());
        Ok(())
    }

    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        dir: &P,
        name: &str,
    ) -> Result<()> {
        let dir = dir.as_ref();
        self.actor.load(&dir.join(format!("{name}-actor.safetensors")))?;
        self.critic.load(&dir.join(format!("{name}-critic.safetensors")))?;
        info!("loaded checkpoint {name} from {}", dir.display());
        Ok(())
    }
}
