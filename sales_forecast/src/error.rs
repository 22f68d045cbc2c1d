//! Error types for the sales_forecast crate

use crate::store::StoreError;
use sales_math::MathError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The series is empty or too short to fit the model
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Horizon is zero or above the configured maximum
    #[error("Invalid horizon {horizon}: must be between 1 and {max}")]
    InvalidHorizon { horizon: usize, max: usize },

    /// The numerical fit failed to converge or produced non-finite values
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Failure reported by the series store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Error related to data validation
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// Whether the caller can fix the request and retry immediately
    pub fn is_caller_correctable(&self) -> bool {
        matches!(
            self,
            ForecastError::InvalidHorizon { .. } | ForecastError::InvalidParameter(_)
        )
    }
}
