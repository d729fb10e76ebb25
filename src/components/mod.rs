//! # Components
//!
//! This module contains the components that are used to build the
//! [`crate::agents::DDPG`] agent.
//!
//! ## Noise
//!
//! The [`OuNoise`] struct implements the Ornstein-Uhlenbeck process, which adds
//! temporally correlated exploration noise to the actions of the agent.
//!
//! ## Replay Buffer
//!
//! The [`ReplayBuffer`] struct implements a FIFO replay buffer with uniform
//! sampling, as used by off-policy algorithms.
//!
//! ## Action Bounds
//!
//! The [`ActionBounds`] struct holds the per-dimension bounds of the action
//! space. It clips actions and shapes the policy gradient near the bounds
//! (inverting gradients).

mod action_bounds;
mod ou_noise;
mod replay_buffer;

pub use action_bounds::ActionBounds;
pub use ou_noise::OuNoise;
pub use replay_buffer::{
    Batch,
    ReplayBuffer,
    Transition,
};
