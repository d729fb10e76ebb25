use thiserror::Error;

/// Errors raised by the agent and its components.
///
/// Everything else (candle, io, config parsing) is propagated as-is through
/// [`anyhow::Error`], so callers that care about these kinds can recover
/// them with `err.downcast_ref::<DdpgError>()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DdpgError {
    /// Sampling asked for more transitions than the buffer holds.
    #[error("insufficient data: requested {requested} transitions but only {available} are stored")]
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// A state or action does not match the configured dimensions.
    #[error("dimension mismatch for {what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// NaN or Inf showed up in targets or gradients.
    #[error("numerical instability: non-finite values in {what}")]
    NumericalInstability {
        what: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
