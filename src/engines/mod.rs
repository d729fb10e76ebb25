//! # Engines
//!
//! Drive an agent through an environment: [`loop_off_policy`] runs the
//! episodes of a single training or evaluation phase, and
//! [`run_experiment_off_policy`] repeats whole runs and stores their results.

mod experiment;
mod run;

pub use experiment::run_experiment_off_policy;
pub use run::{
    loop_off_policy,
    Checkpointing,
};
