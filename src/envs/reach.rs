use {
    super::{
        Environment,
        Step,
        TensorConvertible,
    },
    crate::error::DdpgError,
    anyhow::Result,
    candle_core::{
        DType,
        Device,
        Tensor,
    },
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    rand_distr::Normal,
    serde::{
        Deserialize,
        Serialize,
    },
    std::ops::RangeInclusive,
};


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReachConfig {
    // Length of the observation vector, at least 3 * size_action + 2.
    pub size_state: usize,
    // Number of actuated joints.
    pub size_action: usize,
    // Maximum number of steps per episode.
    pub timelimit: usize,
    // Joint displacement for a saturated action.
    pub step_size: f64,
    // Normalised distance at which the target counts as reached.
    pub goal_tolerance: f64,
    // Standard deviation of the gaussian actuation noise.
    pub actuation_noise: f64,
    pub seed: u64,
}
impl Default for ReachConfig {
    fn default() -> Self {
        Self {
            size_state: 58,
            size_action: 18,
            timelimit: 200,
            step_size: 0.05,
            goal_tolerance: 0.05,
            actuation_noise: 0.01,
            seed: 42,
        }
    }
}

/// Joint excitations, each nominally in `[0, 1]` with `0.5` meaning "hold".
#[derive(Clone, Debug, PartialEq)]
pub struct ReachAction(pub Vec<f64>);

/// `[position, target, position - target, progress, distance, 0, ...]`
#[derive(Clone, Debug, PartialEq)]
pub struct ReachObservation(pub Vec<f64>);

impl TensorConvertible for ReachAction {
    fn from_tensor(value: Tensor) -> Result<Self> {
        Ok(Self(value.flatten_all()?.to_dtype(DType::F64)?.to_vec1::<f64>()?))
    }

    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> Result<Tensor> {
        Ok(Tensor::new(value.0.as_slice(), device)?)
    }
}

impl TensorConvertible for ReachObservation {
    fn from_tensor(value: Tensor) -> Result<Self> {
        Ok(Self(value.flatten_all()?.to_dtype(DType::F64)?.to_vec1::<f64>()?))
    }

    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> Result<Tensor> {
        Ok(Tensor::new(value.0.as_slice(), device)?)
    }
}

/// A point in the unit hypercube, one coordinate per joint, that has to be
/// driven onto a random target.
///
/// Stands in for a musculoskeletal simulator: observations are larger than the
/// action space, actions are bounded excitations and the reward is dense.
pub struct ReachEnv {
    config: ReachConfig,
    rng: StdRng,
    position: Vec<f64>,
    target: Vec<f64>,
    steps: usize,
}

impl ReachEnv {
    /// Normalised euclidean distance between position and target, in `[0, 1]`.
    pub fn distance(&self) -> f64 {
        let squared = self
            .position
            .iter()
            .zip(&self.target)
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>();
        (squared / self.config.size_action as f64).sqrt()
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }
}

impl Environment for ReachEnv {
    type Config = ReachConfig;
    type Action = ReachAction;
    type Observation = ReachObservation;

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn new(config: Self::Config) -> Result<Box<Self>> {
        if config.size_action == 0 || config.size_state < 3 * config.size_action + 2 {
            Err(DdpgError::InvalidConfig(format!(
                "reach observations need at least {} entries for {} joints, got {}",
                3 * config.size_action + 2,
                config.size_action,
                config.size_state,
            )))?
        }
        let mut env = Self {
            rng: StdRng::seed_from_u64(config.seed),
            position: vec![0.5; config.size_action],
            target: vec![0.5; config.size_action],
            steps: 0,
            config,
        };
        env.reset(env.config.seed)?;
        Ok(Box::new(env))
    }

    fn reset(
        &mut self,
        seed: u64,
    ) -> Result<Self::Observation> {
        self.rng = StdRng::seed_from_u64(seed);
        let n = self.config.size_action;
        self.position = (0..n).map(|_| self.rng.gen_range(0.0..=1.0)).collect();
        self.target = (0..n).map(|_| self.rng.gen_range(0.1..=0.9)).collect();
        self.steps = 0;
        Ok(self.current_observation())
    }

    fn step(
        &mut self,
        action: Self::Action,
    ) -> Result<Step<Self::Observation, Self::Action>> {
        if action.0.len() != self.config.size_action {
            Err(DdpgError::DimensionMismatch {
                what: "action",
                expected: vec![self.config.size_action],
                actual: vec![action.0.len()],
            })?
        }
        let noise = Normal::new(0.0, self.config.actuation_noise)?;
        for (p, a) in self.position.iter_mut().zip(&action.0) {
            let velocity = (a.clamp(0.0, 1.0) - 0.5) * 2.0 * self.config.step_size;
            *p = (*p + velocity + self.rng.sample(noise)).clamp(0.0, 1.0);
        }
        self.steps += 1;

        let distance = self.distance();
        let terminated = distance < self.config.goal_tolerance;
        let truncated = !terminated && self.steps >= self.config.timelimit;

        Ok(Step {
            observation: self.current_observation(),
            action,
            reward: if terminated { 1.0 } else { -distance },
            terminated,
            truncated,
        })
    }

    fn timelimit(&self) -> usize {
        self.config.timelimit
    }

    fn action_space(&self) -> Vec<usize> {
        vec![self.config.size_action]
    }

    fn action_domain(&self) -> Vec<RangeInclusive<f64>> {
        vec![0.0..=1.0; self.config.size_action]
    }

    fn observation_space(&self) -> Vec<usize> {
        vec![self.config.size_state]
    }

    fn current_observation(&self) -> Self::Observation {
        let mut observation = Vec::with_capacity(self.config.size_state);
        observation.extend(&self.position);
        observation.extend(&self.target);
        observation.extend(self.position.iter().zip(&self.target).map(|(p, t)| p - t));
        observation.push(self.steps as f64 / self.config.timelimit.max(1) as f64);
        observation.push(self.distance());
        observation.resize(self.config.size_state, 0.0);
        ReachObservation(observation)
    }
}
