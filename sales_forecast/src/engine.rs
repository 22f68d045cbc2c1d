//! Forecast generation over an actual series

use crate::config::EngineConfig;
use crate::error::{ForecastError, Result};
use crate::models::arima::ArimaModel;
use crate::models::{FitOptions, ForecastModel, ModelSpec, TrainedForecastModel};
use crate::series::{ActualSeries, ForecastSeries};
use tracing::debug;

/// Fits the model to a series and extrapolates whole-unit monthly forecasts.
///
/// The engine holds configuration only; every call is a pure function of
/// `(series, horizon, model)`.
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: EngineConfig,
}

impl ForecastEngine {
    /// Create an engine after validating the configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Largest accepted horizon
    pub fn max_horizon(&self) -> usize {
        self.config.max_horizon
    }

    /// Accept horizons in `1..=max_horizon`
    pub fn validate_horizon(&self, horizon: usize) -> Result<()> {
        if horizon == 0 || horizon > self.config.max_horizon {
            return Err(ForecastError::InvalidHorizon {
                horizon,
                max: self.config.max_horizon,
            });
        }
        Ok(())
    }

    /// Forecast the `horizon` months following the last period of `series`.
    ///
    /// Values are rounded half away from zero to whole units here and
    /// nowhere else.
    pub fn forecast(
        &self,
        series: &ActualSeries,
        horizon: usize,
        model: &ModelSpec,
    ) -> Result<ForecastSeries> {
        self.validate_horizon(horizon)?;

        let last = match series.last_period() {
            Some(last) => last,
            None => {
                return Err(ForecastError::InsufficientData {
                    needed: model.min_observations(),
                    got: 0,
                })
            }
        };

        let options = FitOptions {
            optimizer: self.config.optimizer(),
            timeout: Some(self.config.fit_timeout()),
        };
        let trained = ArimaModel::new(*model)?.train(&series.values(), &options)?;
        let raw = trained.forecast(horizon)?;

        let rounded = raw
            .iter()
            .map(|&v| round_to_unit(v))
            .collect::<Result<Vec<i64>>>()?;

        debug!(
            model = %model,
            observations = series.len(),
            horizon,
            after = %last,
            "generated forecast"
        );

        Ok(ForecastSeries::following(last, &rounded)?.with_diagnostics(trained.diagnostics().clone()))
    }
}

/// Nearest whole unit, half away from zero
fn round_to_unit(value: f64) -> Result<i64> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded.abs() >= i64::MAX as f64 {
        return Err(ForecastError::ModelFit(format!(
            "Forecast value {} cannot be represented in whole units",
            value
        )));
    }
    Ok(rounded as i64)
}
