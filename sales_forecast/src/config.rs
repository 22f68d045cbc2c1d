//! Engine configuration

use crate::error::{ForecastError, Result};
use sales_math::optimization::NelderMeadConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for forecasting and caching.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides:
///
/// ```
/// use sales_forecast::config::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{ "max_horizon": 6 }"#).unwrap();
/// assert_eq!(config.max_horizon, 6);
/// assert_eq!(config.default_horizon, 6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest accepted forecast horizon in months
    pub max_horizon: usize,
    /// Horizon used by the batch path and new sessions
    pub default_horizon: usize,
    /// Wall-clock budget for a single model fit
    pub fit_timeout_ms: u64,
    /// Optimiser iteration limit
    pub max_iterations: usize,
    /// Optimiser convergence tolerance (relative)
    pub tolerance: f64,
    /// Number of distinct fingerprints the forecast cache keeps alive
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_horizon: 12,
            default_horizon: 6,
            fit_timeout_ms: 5_000,
            max_iterations: 5_000,
            tolerance: 1e-10,
            cache_capacity: 16,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that the values are usable together
    pub fn validate(&self) -> Result<()> {
        if self.max_horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_horizon must be greater than zero".to_string(),
            ));
        }
        if self.default_horizon == 0 || self.default_horizon > self.max_horizon {
            return Err(ForecastError::InvalidParameter(format!(
                "default_horizon must be between 1 and {}, got {}",
                self.max_horizon, self.default_horizon
            )));
        }
        if self.cache_capacity == 0 {
            return Err(ForecastError::InvalidParameter(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iterations must be greater than zero".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Fit time budget as a `Duration`
    pub fn fit_timeout(&self) -> Duration {
        Duration::from_millis(self.fit_timeout_ms)
    }

    /// Optimiser settings derived from this configuration
    pub fn optimizer(&self) -> NelderMeadConfig {
        NelderMeadConfig {
            max_iter: self.max_iterations,
            tolerance: self.tolerance,
            ..NelderMeadConfig::default()
        }
    }
}
