use {
    crate::{
        components::ActionBounds,
        error::DdpgError,
    },
    anyhow::Result,
    serde::{
        Serialize,
        Deserialize,
    },
};


#[allow(non_camel_case_types)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DDPG_Config {
    // The learning rates for the Actor and Critic networks
    pub actor_learning_rate: f64,
    pub critic_learning_rate: f64,
    // L2 weight regularization of the Critic network.
    pub critic_weight_decay: f64,
    // The impact of the q value of the next state on the current state's q value.
    pub gamma: f64,
    // The weight for updating the target networks.
    pub tau: f64,
    // The number of neurons in the hidden layers of the Actor and Critic networks.
    pub hidden_1_size: usize,
    pub hidden_2_size: usize,
    // The capacity of the replay buffer used for sampling training data.
    pub replay_buffer_capacity: usize,
    // Training starts once the buffer holds more transitions than this.
    pub replay_start_size: usize,
    // The training batch size for each training iteration.
    pub training_batch_size: usize,
    // Ornstein-Uhlenbeck process parameters.
    pub ou_mu: f64,
    pub ou_theta: f64,
    pub ou_sigma: f64,
    // Per-dimension bounds of the action space, for clipping and inverting gradients.
    pub action_bounds: ActionBounds,
}
impl Default for DDPG_Config {
    fn default() -> Self {
        Self {
            actor_learning_rate: 1e-4,
            critic_learning_rate: 1e-3,
            critic_weight_decay: 1e-2,
            gamma: 0.995,
            tau: 0.001,
            hidden_1_size: 400,
            hidden_2_size: 300,
            replay_buffer_capacity: 1_000_000,
            replay_start_size: 50_000,
            training_batch_size: 64,
            ou_mu: 0.0,
            ou_theta: 0.15,
            ou_sigma: 0.2,
            action_bounds: ActionBounds::default(),
        }
    }
}
impl DDPG_Config {
    /// Smaller networks and a short warm-up for the reaching environment.
    pub fn reach(size_action: usize) -> Self {
        Self {
            tau: 0.005,
            hidden_1_size: 64,
            hidden_2_size: 64,
            replay_buffer_capacity: 100_000,
            replay_start_size: 1_000,
            action_bounds: ActionBounds::uniform(size_action, 0.05, 0.95),
            ..Default::default()
        }
    }

    /// Reject configurations under which the agent cannot train correctly.
    pub fn validate(
        &self,
        size_action: usize,
    ) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(DdpgError::InvalidConfig(msg).into()) };

        if self.training_batch_size == 0 {
            return invalid("training_batch_size must be positive".to_owned());
        }
        if self.replay_start_size < self.training_batch_size {
            return invalid(format!(
                "replay_start_size ({}) must be at least training_batch_size ({})",
                self.replay_start_size, self.training_batch_size,
            ));
        }
        if self.replay_buffer_capacity <= self.replay_start_size {
            return invalid(format!(
                "replay_buffer_capacity ({}) must exceed replay_start_size ({}) or training never starts",
                self.replay_buffer_capacity, self.replay_start_size,
            ));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return invalid(format!("tau must be in (0, 1], got {}", self.tau));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return invalid(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        self.action_bounds.validate(size_action)
    }
}
