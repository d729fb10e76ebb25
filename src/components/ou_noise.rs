use candle_core::{
    DType,
    Device,
    Result,
    Tensor,
};

/// Ornstein-Uhlenbeck process, discretised with `dt = 1`.
///
/// Each sample takes one mean-reverting random step
/// `x <- x + theta * (mu - x) + sigma * N(0, 1)`, which makes consecutive
/// samples temporally correlated.
#[derive(Clone)]
pub struct OuNoise {
    mu: f64,
    theta: f64,
    sigma: f64,
    state: Tensor,
}
impl OuNoise {
    pub fn new(
        mu: f64,
        theta: f64,
        sigma: f64,
        size_action: usize,
        device: &Device,
    ) -> Result<Self> {
        Ok(Self {
            mu,
            theta,
            sigma,
            state: (Tensor::ones(size_action, DType::F64, device)? * mu)?,
        })
    }

    pub fn sample(&mut self) -> Result<Tensor> {
        let rand = Tensor::randn_like(&self.state, 0.0, 1.0)?;
        let dx = ((self.theta * (self.mu - &self.state)?)? + (self.sigma * rand)?)?;
        self.state = (&self.state + dx)?;
        Ok(self.state.clone())
    }

    /// Put the process back at its mean, e.g. when an episode ends.
    pub fn reset(&mut self) -> Result<()> {
        self.state = (self.state.ones_like()? * self.mu)?;
        Ok(())
    }

    pub fn state(&self) -> &Tensor {
        &self.state
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }
}
