mod reach;

use {
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    std::ops::RangeInclusive,
};

pub use crate::envs::reach::{
    ReachAction,
    ReachConfig,
    ReachEnv,
    ReachObservation,
};

pub trait TensorConvertible: Sized {
    fn from_tensor(value: Tensor) -> Result<Self>;
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> Result<Tensor>;
}

#[derive(Debug)]
pub struct Step<O, A> {
    pub observation: O,
    pub action: A,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
}

pub trait Environment {
    type Config;
    type Action;
    type Observation;

    fn config(&self) -> &Self::Config;
    fn new(config: Self::Config) -> Result<Box<Self>>;
    fn reset(
        &mut self,
        seed: u64,
    ) -> Result<Self::Observation>;
    fn step(
        &mut self,
        action: Self::Action,
    ) -> Result<Step<Self::Observation, Self::Action>>;
    fn timelimit(&self) -> usize;
    fn action_space(&self) -> Vec<usize>;
    fn action_domain(&self) -> Vec<RangeInclusive<f64>>;
    fn observation_space(&self) -> Vec<usize>;
    fn current_observation(&self) -> Self::Observation;
}
