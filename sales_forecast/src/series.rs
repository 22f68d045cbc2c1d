//! Period-indexed monthly series

use crate::error::{ForecastError, Result};
use crate::models::FitDiagnostics;
use crate::period::Period;
use serde::{Deserialize, Serialize};

/// One observed monthly total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    pub value: f64,
}

impl Observation {
    pub fn new(period: Period, value: f64) -> Self {
        Self { period, value }
    }
}

/// Observed monthly totals, strictly increasing by period.
///
/// Gaps between months are allowed and passed through untouched.
/// Non-finite values are accepted here and rejected by the model fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActualSeries {
    points: Vec<Observation>,
}

impl ActualSeries {
    /// Build a series, checking ordering and sign
    pub fn new(points: Vec<Observation>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].period <= pair[0].period {
                return Err(ForecastError::DataError(format!(
                    "Periods must be strictly increasing: {} follows {}",
                    pair[1].period, pair[0].period
                )));
            }
        }
        if let Some(negative) = points.iter().find(|o| o.value < 0.0) {
            return Err(ForecastError::DataError(format!(
                "Negative value {} at {}",
                negative.value, negative.period
            )));
        }

        Ok(Self { points })
    }

    /// Build a series from `(period, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Period, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(period, value)| Observation::new(period, value))
                .collect(),
        )
    }

    /// A series with no observations
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap points already known to satisfy the ordering invariant
    pub(crate) fn from_ordered(points: Vec<Observation>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.points.iter()
    }

    /// Values in period order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|o| o.value).collect()
    }

    /// Periods in order
    pub fn periods(&self) -> Vec<Period> {
        self.points.iter().map(|o| o.period).collect()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.points.first().map(|o| o.period)
    }

    pub fn last_period(&self) -> Option<Period> {
        self.points.last().map(|o| o.period)
    }

    /// The last `n` observations (all of them if fewer)
    pub fn tail(&self, n: usize) -> ActualSeries {
        let start = self.points.len().saturating_sub(n);
        Self::from_ordered(self.points[start..].to_vec())
    }
}

/// One forecast month, in whole units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: Period,
    pub value: i64,
}

/// Predicted monthly totals over consecutive months.
///
/// Equality compares the points only; fit diagnostics are metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
    #[serde(skip)]
    diagnostics: Option<FitDiagnostics>,
}

impl ForecastSeries {
    /// Build a forecast, checking that the months are consecutive
    pub fn new(points: Vec<ForecastPoint>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].period != pair[0].period.next()? {
                return Err(ForecastError::DataError(format!(
                    "Forecast months must be consecutive: {} follows {}",
                    pair[1].period, pair[0].period
                )));
            }
        }

        Ok(Self {
            points,
            diagnostics: None,
        })
    }

    /// Lay `values` over the months following `last`
    pub fn following(last: Period, values: &[i64]) -> Result<Self> {
        let mut points = Vec::with_capacity(values.len());
        let mut period = last;
        for &value in values {
            period = period.next()?;
            points.push(ForecastPoint { period, value });
        }

        Ok(Self {
            points,
            diagnostics: None,
        })
    }

    /// A forecast with no months
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn with_diagnostics(mut self, diagnostics: FitDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter()
    }

    /// Values as floats, for arithmetic
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value as f64).collect()
    }

    pub fn periods(&self) -> Vec<Period> {
        self.points.iter().map(|p| p.period).collect()
    }

    /// Sum of all forecast values
    pub fn total(&self) -> i64 {
        self.points.iter().map(|p| p.value).sum()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.points.first().map(|p| p.period)
    }

    pub fn last_period(&self) -> Option<Period> {
        self.points.last().map(|p| p.period)
    }

    /// Parameters of the fit that produced this forecast, if any
    pub fn diagnostics(&self) -> Option<&FitDiagnostics> {
        self.diagnostics.as_ref()
    }

    /// The forecast as `(period, value)` observations
    pub fn to_observations(&self) -> Vec<Observation> {
        self.points
            .iter()
            .map(|p| Observation::new(p.period, p.value as f64))
            .collect()
    }
}

impl PartialEq for ForecastSeries {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}
