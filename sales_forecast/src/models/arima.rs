//! ARIMA models for monthly series
//!
//! Parameters are estimated by minimising the conditional sum of squares
//! (CSS) of one-step residuals with a bounded Nelder-Mead search started
//! from a fixed point, so a given series always yields the same fit.
//!
//! Only the AR and MA coefficients are bounded. The intercept is the
//! process mean and is left free, so a strongly persistent trending series
//! can place it outside the observed range; forecasts then drift towards it
//! geometrically at rate `phi`.

use crate::error::{ForecastError, Result};
use crate::models::{FitDiagnostics, FitOptions, ForecastModel, ModelSpec, TrainedForecastModel};
use crate::utils::forecast_accuracy;
use sales_math::optimization::nelder_mead;
use sales_math::stats;
use std::time::Instant;
use tracing::debug;

/// Coefficient bound that keeps the AR part stationary and the MA part invertible
const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// Model order
    spec: ModelSpec,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model
    name: String,
    /// Model order
    spec: ModelSpec,
    /// Original observations
    history: Vec<f64>,
    /// Differenced observations the ARMA part was fitted on
    working: Vec<f64>,
    /// One-step residuals on the working scale
    residuals: Vec<f64>,
    /// Fitted parameters
    diagnostics: FitDiagnostics,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(spec: ModelSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            name: spec.to_string(),
            spec,
        })
    }

    /// Model order
    pub fn spec(&self) -> ModelSpec {
        self.spec
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, values: &[f64], options: &FitOptions) -> Result<TrainedArimaModel> {
        let needed = self.spec.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if !stats::all_finite(values) {
            return Err(ForecastError::ModelFit(
                "Series contains non-finite values".to_string(),
            ));
        }

        let (p, q) = (self.spec.p, self.spec.q);
        let working = difference(values, self.spec.d);
        let level = stats::mean(&working)?;
        let spread = stats::variance(&working)?;

        let (intercept, ar, ma, iterations, converged) =
            if spread <= f64::EPSILON * level.abs().max(1.0) || p + q == 0 {
                // Nothing to estimate beyond the level
                (level, vec![0.0; p], vec![0.0; q], 0, true)
            } else {
                let mut initial = vec![0.0; 1 + p + q];
                initial[0] = level;
                if p > 0 {
                    initial[1] = stats::lag1_autocorrelation(&working)
                        .unwrap_or(0.0)
                        .clamp(-0.9, 0.9);
                }

                let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
                bounds.extend(std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(p + q));

                let deadline = options.timeout.map(|t| Instant::now() + t);
                let result = nelder_mead(
                    |params| conditional_sum_of_squares(&working, p, q, params),
                    &initial,
                    Some(&bounds),
                    &options.optimizer,
                    deadline,
                )?;

                if result.timed_out {
                    return Err(ForecastError::ModelFit(format!(
                        "{} fit did not finish within {:?}",
                        self.name,
                        options.timeout.unwrap_or_default()
                    )));
                }
                if !result.optimal_value.is_finite() || !stats::all_finite(&result.optimal_point)
                {
                    return Err(ForecastError::ModelFit(format!(
                        "{} fit produced non-finite parameters",
                        self.name
                    )));
                }
                if !result.converged {
                    return Err(ForecastError::ModelFit(format!(
                        "{} fit did not converge after {} iterations",
                        self.name, result.iterations
                    )));
                }

                let point = result.optimal_point;
                (
                    point[0],
                    point[1..1 + p].to_vec(),
                    point[1 + p..].to_vec(),
                    result.iterations,
                    result.converged,
                )
            };

        let (fitted, residuals) = one_step_predictions(&working, intercept, &ar, &ma);
        let start = p.max(q);
        let scored = &residuals[start..];
        let residual_variance = if scored.is_empty() {
            0.0
        } else {
            scored.iter().map(|r| r * r).sum::<f64>() / scored.len() as f64
        };
        if !residual_variance.is_finite() {
            return Err(ForecastError::ModelFit(format!(
                "{} fit produced non-finite residuals",
                self.name
            )));
        }

        // Back on the original scale, observation t + d is predicted from fitted[t]
        let predicted: Vec<f64> = (start..working.len())
            .map(|t| match self.spec.d {
                0 => fitted[t],
                _ => values[t] + fitted[t],
            })
            .collect();
        let observed = &values[start + self.spec.d..];
        let in_sample = forecast_accuracy(&predicted, observed).ok();

        debug!(
            model = %self.name,
            n = values.len(),
            intercept,
            ar = ?ar,
            ma = ?ma,
            iterations,
            converged,
            residual_variance,
            "fitted model"
        );

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            spec: self.spec,
            history: values.to_vec(),
            working,
            residuals,
            diagnostics: FitDiagnostics {
                intercept,
                ar_coefficients: ar,
                ma_coefficients: ma,
                residual_variance,
                iterations,
                converged,
                in_sample,
            },
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        if self.history.is_empty() {
            return Err(ForecastError::ModelFit(
                "Model has not been fitted to data".to_string(),
            ));
        }

        let d = &self.diagnostics;
        let mut extended = self.working.clone();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut prediction = d.intercept;
            for (i, phi) in d.ar_coefficients.iter().enumerate() {
                if t > i {
                    prediction += phi * (extended[t - 1 - i] - d.intercept);
                }
            }
            for (i, theta) in d.ma_coefficients.iter().enumerate() {
                if t > i {
                    prediction += theta * shocks[t - 1 - i];
                }
            }
            extended.push(prediction);
            // Future shocks have zero expectation
            shocks.push(0.0);
        }

        let steps = &extended[self.working.len()..];
        let forecasts = match self.spec.d {
            0 => steps.to_vec(),
            _ => {
                let mut level = self.history[self.history.len() - 1];
                steps
                    .iter()
                    .map(|step| {
                        level += step;
                        level
                    })
                    .collect()
            }
        };

        if !stats::all_finite(&forecasts) {
            return Err(ForecastError::ModelFit(format!(
                "{} produced non-finite forecasts",
                self.name
            )));
        }

        Ok(forecasts)
    }

    fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Apply first differences `d` times
fn difference(values: &[f64], d: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for _ in 0..d {
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// CSS objective over `[intercept, ar.., ma..]`
fn conditional_sum_of_squares(series: &[f64], p: usize, q: usize, params: &[f64]) -> f64 {
    let start = p.max(q);
    if series.len() <= start {
        return f64::INFINITY;
    }

    let (_, residuals) =
        one_step_predictions(series, params[0], &params[1..1 + p], &params[1 + p..1 + p + q]);
    let css: f64 = residuals[start..].iter().map(|e| e * e).sum();

    if css.is_finite() {
        css
    } else {
        f64::INFINITY
    }
}

/// One-step-ahead predictions and residuals. The first `max(p, q)` entries
/// have no prediction and a zero residual.
fn one_step_predictions(
    series: &[f64],
    intercept: f64,
    ar: &[f64],
    ma: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let n = series.len();
    let start = ar.len().max(ma.len());
    let mut fitted = vec![f64::NAN; n];
    let mut residuals = vec![0.0; n];

    for t in start..n {
        let mut prediction = intercept;
        for (i, phi) in ar.iter().enumerate() {
            prediction += phi * (series[t - 1 - i] - intercept);
        }
        for (i, theta) in ma.iter().enumerate() {
            prediction += theta * residuals[t - 1 - i];
        }
        fitted[t] = prediction;
        residuals[t] = series[t] - prediction;
    }

    (fitted, residuals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sales() -> Vec<f64> {
        vec![100.0, 110.0, 105.0, 120.0, 115.0, 130.0]
    }

    fn train(spec: ModelSpec, values: &[f64]) -> Result<TrainedArimaModel> {
        ArimaModel::new(spec)?.train(values, &FitOptions::default())
    }

    #[test]
    fn test_arma_fit_and_forecast() {
        let trained = train(ModelSpec::SALES, &sales()).unwrap();
        let diagnostics = trained.diagnostics();

        assert!(diagnostics.converged);
        assert!(diagnostics.ar_coefficients[0].abs() <= COEFFICIENT_BOUND);
        assert!(diagnostics.ma_coefficients[0].abs() <= COEFFICIENT_BOUND);
        assert!(diagnostics.residual_variance.is_finite());
        assert!(diagnostics.in_sample.is_some());

        let forecast = trained.forecast(3).unwrap();
        assert_eq!(forecast.len(), 3);
        for value in &forecast {
            assert!(value.is_finite());
            assert!(*value > 50.0 && *value < 200.0, "unexpected forecast {}", value);
        }
    }

    #[test]
    fn test_forecast_decays_towards_fitted_mean() {
        let trained = train(ModelSpec::SALES, &sales()).unwrap();
        let mean = trained.diagnostics().intercept;
        let phi = trained.diagnostics().ar_coefficients[0];

        // Past the first step every shock is zero, leaving pure AR decay
        let forecast = trained.forecast(12).unwrap();
        for pair in forecast.windows(2) {
            assert_relative_eq!(pair[1] - mean, phi * (pair[0] - mean), epsilon = 1e-6);
        }
        let first_gap = (forecast[0] - mean).abs();
        let last_gap = (forecast[11] - mean).abs();
        assert!(last_gap <= first_gap);
    }

    #[test]
    fn test_in_sample_accuracy_of_a_perfect_fit() {
        let values: Vec<f64> = (0..12).map(|i| 100.0 + 5.0 * i as f64).collect();
        let trained = train(ModelSpec::new(0, 1, 0), &values).unwrap();
        let accuracy = trained.diagnostics().in_sample.clone().unwrap();

        assert_relative_eq!(accuracy.mae, 0.0, epsilon = 1e-9);
        assert_relative_eq!(accuracy.mape.unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(accuracy.accuracy_pct().unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_in_sample_accuracy_aligns_differenced_predictions() {
        // Mean step 20/3; observation t + 1 is predicted as values[t] + 20/3
        let values = [100.0, 110.0, 105.0, 120.0];
        let trained = train(ModelSpec::new(0, 1, 0), &values).unwrap();
        let accuracy = trained.diagnostics().in_sample.clone().unwrap();

        let step = 20.0 / 3.0;
        let errors = [110.0 - (100.0 + step), 105.0 - (110.0 + step), 120.0 - (105.0 + step)];
        let mae = errors.iter().map(|e: &f64| e.abs()).sum::<f64>() / 3.0;
        let mape = (errors[0].abs() / 110.0 + errors[1].abs() / 105.0 + errors[2].abs() / 120.0)
            / 3.0
            * 100.0;

        assert_relative_eq!(accuracy.mae, mae, epsilon = 1e-9);
        assert_relative_eq!(accuracy.mape.unwrap(), mape, epsilon = 1e-9);
    }

    #[test]
    fn test_in_sample_accuracy_without_differencing() {
        // White noise around 100: every observation is predicted as the mean
        let trained = train(ModelSpec::new(0, 0, 0), &[100.0, 110.0, 90.0, 100.0]).unwrap();
        let accuracy = trained.diagnostics().in_sample.clone().unwrap();

        assert_relative_eq!(accuracy.mae, 5.0, epsilon = 1e-9);
        let mape = (10.0 / 110.0 + 10.0 / 90.0) / 4.0 * 100.0;
        assert_relative_eq!(accuracy.mape.unwrap(), mape, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_is_repeatable() {
        let first = train(ModelSpec::SALES, &sales()).unwrap();
        let second = train(ModelSpec::SALES, &sales()).unwrap();

        assert_eq!(first.diagnostics(), second.diagnostics());
        assert_eq!(first.forecast(6).unwrap(), second.forecast(6).unwrap());
    }

    #[test]
    fn test_constant_series_forecasts_its_level() {
        let trained = train(ModelSpec::SALES, &[250.0; 8]).unwrap();
        assert_eq!(trained.diagnostics().iterations, 0);

        for value in trained.forecast(4).unwrap() {
            assert_relative_eq!(value, 250.0);
        }
    }

    #[test]
    fn test_ar1_recovers_persistence() {
        // x_t = 50 + 0.7 (x_{t-1} - 50) + small deterministic shocks
        let shocks = [3.0, 1.0, -4.0, -2.0, 5.0, -1.0, -3.0, 2.0, 0.0, -1.0];
        let mut values = vec![80.0];
        for t in 1..60 {
            let shock = shocks[t % shocks.len()];
            let prev = values[t - 1];
            values.push(50.0 + 0.7 * (prev - 50.0) + shock);
        }

        let trained = train(ModelSpec::new(1, 0, 0), &values).unwrap();
        let phi = trained.diagnostics().ar_coefficients[0];
        assert!(phi > 0.4 && phi < 0.95, "phi = {}", phi);
    }

    #[test]
    fn test_random_walk_with_differencing() {
        let values: Vec<f64> = (0..12).map(|i| 100.0 + 5.0 * i as f64).collect();
        let trained = train(ModelSpec::new(0, 1, 0), &values).unwrap();

        let forecast = trained.forecast(2).unwrap();
        assert_relative_eq!(forecast[0], 160.0, epsilon = 1e-9);
        assert_relative_eq!(forecast[1], 165.0, epsilon = 1e-9);
    }

    #[test]
    fn test_insufficient_data() {
        let err = train(ModelSpec::SALES, &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { needed: 4, got: 3 }
        ));
    }

    #[test]
    fn test_non_finite_values() {
        let err = train(ModelSpec::SALES, &[1.0, 2.0, f64::NAN, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, ForecastError::ModelFit(_)));
    }

    #[test]
    fn test_zero_timeout_is_a_fit_error() {
        let options = FitOptions {
            timeout: Some(std::time::Duration::ZERO),
            ..FitOptions::default()
        };
        let err = ArimaModel::new(ModelSpec::SALES)
            .unwrap()
            .train(&sales(), &options)
            .unwrap_err();
        assert!(matches!(err, ForecastError::ModelFit(_)));
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1.0, 4.0, 9.0], 1), vec![3.0, 5.0]);
        assert_eq!(difference(&[1.0, 4.0, 9.0], 0), vec![1.0, 4.0, 9.0]);
    }
}
