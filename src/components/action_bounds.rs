use {
    crate::error::DdpgError,
    anyhow::Result,
    candle_core::Tensor,
    serde::{
        Deserialize,
        Serialize,
    },
};

/// Per-dimension bounds `[low, high]` of a continuous action space.
///
/// The same bounds are used to clip the actions that are sent to the
/// environment and to shape the policy gradient near the edges of the action
/// space (see [`ActionBounds::invert_gradients`]), so the two can never drift
/// apart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionBounds {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl Default for ActionBounds {
    fn default() -> Self {
        Self::uniform(18, 0.05, 0.95)
    }
}

impl ActionBounds {
    pub fn new(
        low: Vec<f64>,
        high: Vec<f64>,
    ) -> Result<Self> {
        let bounds = Self { low, high };
        bounds.validate(bounds.low.len())?;
        Ok(bounds)
    }

    /// The same `[low, high]` interval for every one of `size_action` dimensions.
    pub fn uniform(
        size_action: usize,
        low: f64,
        high: f64,
    ) -> Self {
        Self {
            low: vec![low; size_action],
            high: vec![high; size_action],
        }
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    /// Check that there is one non-empty interval per action dimension.
    pub fn validate(
        &self,
        size_action: usize,
    ) -> Result<()> {
        if self.low.len() != size_action || self.high.len() != size_action {
            Err(DdpgError::InvalidConfig(format!(
                "action bounds have {} lower and {} upper values for {size_action} action dimensions",
                self.low.len(),
                self.high.len(),
            )))?
        }
        if let Some(dim) = self
            .low
            .iter()
            .zip(&self.high)
            .position(|(low, high)| !(low < high))
        {
            Err(DdpgError::InvalidConfig(format!(
                "action bound of dimension {dim} is empty: [{}, {}]",
                self.low[dim], self.high[dim],
            )))?
        }
        Ok(())
    }

    fn as_tensors(
        &self,
        like: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        let actual = like.dims().last().copied().unwrap_or(0);
        if actual != self.len() {
            Err(DdpgError::DimensionMismatch {
                what: "action",
                expected: vec![self.len()],
                actual: like.dims().to_vec(),
            })?
        }
        let low = Tensor::new(self.low.as_slice(), like.device())?.to_dtype(like.dtype())?;
        let high = Tensor::new(self.high.as_slice(), like.device())?.to_dtype(like.dtype())?;
        Ok((low, high))
    }

    /// Clip a single action `[size_action]` or a batch `[n, size_action]`
    /// into the bounds.
    pub fn clip(
        &self,
        actions: &Tensor,
    ) -> Result<Tensor> {
        let (low, high) = self.as_tensors(actions)?;
        Ok(actions.broadcast_maximum(&low)?.broadcast_minimum(&high)?)
    }

    /// Inverting gradients for bounded actions.
    ///
    /// `dq` is the ascent direction of the action value with respect to the
    /// actions, for a batch `[n, size_action]`. Components pushing an action
    /// up are scaled by the distance to the upper bound, all others by the
    /// distance to the lower bound:
    ///
    /// ```text
    /// dq > 0  =>  dq * (high - a)
    /// dq <= 0 =>  dq * (a - low)
    /// ```
    ///
    /// so the gradient fades out as the action approaches the bound it is
    /// being pushed against.
    pub fn invert_gradients(
        &self,
        dq: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor> {
        if dq.dims() != actions.dims() {
            Err(DdpgError::DimensionMismatch {
                what: "action gradients",
                expected: actions.dims().to_vec(),
                actual: dq.dims().to_vec(),
            })?
        }
        let (low, high) = self.as_tensors(actions)?;

        let room_up = actions.broadcast_sub(&high)?.neg()?;
        let room_down = actions.broadcast_sub(&low)?;
        let pushing_up = dq.gt(0.0)?;

        Ok(pushing_up.where_cond(&(dq * room_up)?, &(dq * room_down)?)?)
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        candle_core::Device,
        proptest::prelude::*,
    };

    #[test]
    fn test_clip_out_of_range() -> Result<()> {
        let bounds = ActionBounds::uniform(4, 0.05, 0.95);
        let actions = Tensor::new(&[-3.0f64, 0.5, 0.95, 17.0], &Device::Cpu)?;

        let clipped = bounds.clip(&actions)?.to_vec1::<f64>()?;
        assert_eq!(clipped, vec![0.05, 0.5, 0.95, 0.95]);
        Ok(())
    }

    #[test]
    fn test_clip_per_dimension_batch() -> Result<()> {
        let bounds = ActionBounds::new(vec![0.0, -1.0], vec![1.0, 0.0])?;
        let actions = Tensor::new(&[[2.0f64, 2.0], [-2.0, -2.0]], &Device::Cpu)?;

        let clipped = bounds.clip(&actions)?.to_vec2::<f64>()?;
        assert_eq!(clipped, vec![vec![1.0, 0.0], vec![0.0, -1.0]]);
        Ok(())
    }

    #[test]
    fn test_clip_rejects_wrong_dimension() -> Result<()> {
        let bounds = ActionBounds::uniform(18, 0.05, 0.95);
        let actions = Tensor::zeros(17, candle_core::DType::F64, &Device::Cpu)?;

        let err = bounds.clip(&actions).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DdpgError>(),
            Some(DdpgError::DimensionMismatch { .. }),
        ));
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(ActionBounds::new(vec![0.0, 0.5], vec![1.0, 0.5]).is_err());
        assert!(ActionBounds::new(vec![0.0], vec![1.0, 2.0]).is_err());
        assert!(ActionBounds::default().validate(18).is_ok());
        assert!(ActionBounds::default().validate(3).is_err());
    }

    #[test]
    fn test_gradient_vanishes_at_the_bound_it_is_pushed_against() -> Result<()> {
        let bounds = ActionBounds::uniform(2, 0.05, 0.95);
        let actions = Tensor::new(&[[0.95f64, 0.05]], &Device::Cpu)?;
        let dq = Tensor::new(&[[1.0f64, -1.0]], &Device::Cpu)?;

        let shaped = bounds.invert_gradients(&dq, &actions)?.to_vec2::<f64>()?;
        assert_eq!(shaped, vec![vec![0.0, 0.0]]);

        // Pushing away from the bound keeps the full range available.
        let dq = Tensor::new(&[[-1.0f64, 1.0]], &Device::Cpu)?;
        let shaped = bounds.invert_gradients(&dq, &actions)?.to_vec2::<f64>()?;
        assert!((shaped[0][0] + 0.9).abs() < 1e-12);
        assert!((shaped[0][1] - 0.9).abs() < 1e-12);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_inverting_gradient_law(
            samples in prop::collection::vec((0.05f64..=0.95, -10.0f64..10.0), 1..32),
        ) {
            let bounds = ActionBounds::uniform(1, 0.05, 0.95);
            let (a, dq): (Vec<f64>, Vec<f64>) = samples.iter().copied().unzip();
            let n = a.len();
            let actions = Tensor::from_vec(a.clone(), (n, 1), &Device::Cpu).unwrap();
            let grads = Tensor::from_vec(dq.clone(), (n, 1), &Device::Cpu).unwrap();

            let shaped = bounds
                .invert_gradients(&grads, &actions)
                .unwrap()
                .flatten_all()
                .unwrap()
                .to_vec1::<f64>()
                .unwrap();

            for i in 0..n {
                let expected = if dq[i] > 0.0 {
                    dq[i] * (0.95 - a[i])
                } else {
                    dq[i] * (a[i] - 0.05)
                };
                prop_assert!((shaped[i] - expected).abs() < 1e-12);
            }
        }
    }
}
