//! # Agents
//!
//! The [`DDPG`] agent and the interfaces it is built against.
//!
//! The agent never looks inside its function approximators. It only needs the
//! operations of [`ActorFunction`] and [`CriticFunction`], which is why any
//! differentiable backend can be plugged in. The candle implementations in
//! [`networks`] are the ones used by the CLI.

mod ddpg;
pub mod networks;

pub use ddpg::{
    compute_targets,
    DDPG,
};

use {
    crate::components::ReplayBuffer,
    anyhow::Result,
    candle_core::Tensor,
    std::path::Path,
    strum::Display,
};


/// The execution mode of an agent is either training or testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum RunMode {
    Train,
    Test,
}

/// Off-policy agents do not train until they have collected enough
/// experience. The switch from [`TrainingPhase::Warmup`] to
/// [`TrainingPhase::Active`] happens once and is never undone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum TrainingPhase {
    Warmup,
    Active,
}

/// A deterministic policy with a live and a slowly tracking target copy.
///
/// States are `[size_state]` for single calls and `[n, size_state]` for
/// batches, actions likewise with `size_action`.
pub trait ActorFunction {
    /// Live policy, one state.
    fn action(
        &self,
        state: &Tensor,
    ) -> candle_core::Result<Tensor>;

    /// Live policy, batched.
    fn actions(
        &self,
        states: &Tensor,
    ) -> candle_core::Result<Tensor>;

    /// Target policy, batched.
    fn target_actions(
        &self,
        next_states: &Tensor,
    ) -> candle_core::Result<Tensor>;

    /// One gradient ascent step on the live parameters.
    ///
    /// `action_gradients` holds, per sample, the direction in which the
    /// action should move. It is chained through the policy network to the
    /// parameters.
    fn train(
        &mut self,
        action_gradients: &Tensor,
        states: &Tensor,
    ) -> candle_core::Result<()>;

    /// `target <- tau * live + (1 - tau) * target`
    fn update_target(&mut self) -> candle_core::Result<()>;
}

/// An action-value function with a live and a slowly tracking target copy.
pub trait CriticFunction {
    /// Target network Q-values `[n, 1]`.
    fn target_q(
        &self,
        next_states: &Tensor,
        next_actions: &Tensor,
    ) -> candle_core::Result<Tensor>;

    /// One descent step on the mean squared error between the live Q-values
    /// of `(states, actions)` and `targets` (`[n, 1]`).
    fn train(
        &mut self,
        targets: &Tensor,
        states: &Tensor,
        actions: &Tensor,
    ) -> candle_core::Result<()>;

    /// Per-sample gradient `[n, size_action]` of the critic's minimisation
    /// objective `-Q(s, a)` with respect to the actions. Its negation is
    /// `dQ/da`, the deterministic policy gradient.
    fn gradients(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> candle_core::Result<Tensor>;

    /// `target <- tau * live + (1 - tau) * target`
    fn update_target(&mut self) -> candle_core::Result<()>;
}

/// Networks whose parameters (live and target) can be written to and read
/// back from a single file.
pub trait SaveableNetwork {
    fn save(
        &self,
        path: &Path,
    ) -> Result<()>;

    fn load(
        &mut self,
        path: &Path,
    ) -> Result<()>;
}

pub trait SaveableAlgorithm {
    /// Store everything needed to restore the agent under `dir`, with file
    /// names starting with `name`.
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        dir: &P,
        name: &str,
    ) -> Result<()>;

    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        dir: &P,
        name: &str,
    ) -> Result<()>;
}

pub trait Algorithm {
    type Config;

    fn config(&self) -> &Self::Config;

    /// Select an action for a single state, with exploration noise in
    /// [`RunMode::Train`] and without in [`RunMode::Test`].
    fn actions(
        &mut self,
        state: &Tensor,
        mode: RunMode,
    ) -> Result<Tensor>;
}

pub trait OffPolicyAlgorithm: Algorithm {
    /// Store a transition and train on the replay buffer if warmed up.
    fn perceive(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: f64,
        next_state: &Tensor,
        done: bool,
    ) -> Result<()>;

    /// Called when an episode ends without a terminal transition, e.g. on a
    /// time limit.
    fn end_episode(&mut self) -> Result<()>;

    fn replay_buffer(&self) -> &ReplayBuffer;
}
