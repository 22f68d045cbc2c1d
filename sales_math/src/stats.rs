//! Descriptive statistics over plain value slices
//!
//! Contains the small set of statistics the forecasting crates need:
//! - Sum and arithmetic mean
//! - Trailing-window mean
//! - Population variance and lag-1 autocorrelation

use crate::{MathError, Result};

/// Sum of all values. An empty slice sums to zero.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty series".to_string(),
        ));
    }

    Ok(sum(values) / values.len() as f64)
}

/// Mean of the last `window` values
pub fn trailing_mean(values: &[f64], window: usize) -> Result<f64> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }

    if values.len() < window {
        return Err(MathError::InsufficientData(format!(
            "Not enough data for trailing mean. Need {} values, have {}.",
            window,
            values.len()
        )));
    }

    mean(&values[values.len() - window..])
}

/// Population variance of the values
pub fn variance(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    Ok(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Lag-1 sample autocorrelation
pub fn lag1_autocorrelation(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Autocorrelation needs at least 2 values, have {}",
            values.len()
        )));
    }

    let m = mean(values)?;
    let denominator: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if denominator.abs() < 1e-12 {
        return Err(MathError::CalculationError(
            "Autocorrelation is undefined for a constant series".to_string(),
        ));
    }

    let numerator: f64 = values
        .windows(2)
        .map(|w| (w[0] - m) * (w[1] - m))
        .sum();

    Ok(numerator / denominator)
}

/// Whether every value is finite (no NaN or infinity)
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
