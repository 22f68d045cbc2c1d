//! Forecasting models for monthly value series

use crate::error::{ForecastError, Result};
use crate::utils::ForecastAccuracy;
use sales_math::optimization::NelderMeadConfig;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::time::Duration;

/// Order of an ARIMA model: (autoregressive, differencing, moving-average)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ModelSpec {
    /// The order every sales forecast is fitted with
    pub const SALES: ModelSpec = ModelSpec::new(1, 0, 1);

    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Fewest observations a fit accepts: one more than `p + d + q + 1`
    pub fn min_observations(&self) -> usize {
        self.p + self.d + self.q + 2
    }

    /// Reject orders the estimator does not handle
    pub fn validate(&self) -> Result<()> {
        if self.d > 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "Differencing order {} is not supported (maximum 1)",
                self.d
            )));
        }
        if self.p > 3 || self.q > 3 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} exceeds the supported AR/MA order of 3",
                self
            )));
        }
        Ok(())
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::SALES
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Settings that bound a single fit
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Optimiser settings
    pub optimizer: NelderMeadConfig,
    /// Wall-clock budget for the fit, `None` for unbounded
    pub timeout: Option<Duration>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            optimizer: NelderMeadConfig::default(),
            timeout: None,
        }
    }
}

/// Fitted parameters and goodness-of-fit figures of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Process mean on the (differenced) working scale
    pub intercept: f64,
    /// Fitted AR coefficients
    pub ar_coefficients: Vec<f64>,
    /// Fitted MA coefficients
    pub ma_coefficients: Vec<f64>,
    /// Mean squared one-step residual
    pub residual_variance: f64,
    /// Optimiser iterations used (0 for a constant series)
    pub iterations: usize,
    /// Whether the optimiser reached its tolerance
    pub converged: bool,
    /// One-step-ahead in-sample accuracy on the original scale
    pub in_sample: Option<ForecastAccuracy>,
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Point forecasts for the next `horizon` steps, unrounded
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;

    /// Parameters and fit quality
    fn diagnostics(&self) -> &FitDiagnostics;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on an ordered value sequence
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on the values, oldest first
    fn train(&self, values: &[f64], options: &FitOptions) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod arima;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_spec() {
        let spec = ModelSpec::default();
        assert_eq!(spec, ModelSpec::SALES);
        assert_eq!(spec.to_string(), "ARIMA(1,0,1)");
        assert_eq!(spec.min_observations(), 4);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_unsupported_orders() {
        assert!(ModelSpec::new(1, 2, 1).validate().is_err());
        assert!(ModelSpec::new(4, 0, 0).validate().is_err());
        assert!(ModelSpec::new(0, 1, 0).validate().is_ok());
    }
}
