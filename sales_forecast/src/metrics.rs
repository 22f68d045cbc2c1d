//! Business KPIs derived from actual and forecast series
//!
//! KPIs are advisory: missing or too-short inputs produce
//! [`KpiValue::NotAvailable`] instead of an error.

use crate::series::{ActualSeries, ForecastSeries};
use crate::utils::format_thousands;
use sales_math::stats;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single KPI reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum KpiValue {
    /// A currency or unit amount
    Amount(f64),
    /// A percentage, e.g. `4.5` for 4.5%
    Percent(f64),
    /// A number of months
    Months(usize),
    /// Not enough data to compute
    NotAvailable,
}

impl KpiValue {
    pub fn is_available(&self) -> bool {
        !matches!(self, KpiValue::NotAvailable)
    }

    /// Numeric reading, if available
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            KpiValue::Amount(v) | KpiValue::Percent(v) => Some(v),
            KpiValue::Months(m) => Some(m as f64),
            KpiValue::NotAvailable => None,
        }
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiValue::Amount(v) => write!(f, "{}", format_thousands(*v)),
            KpiValue::Percent(v) => write!(f, "{:.2}%", v),
            KpiValue::Months(m) => write!(f, "{} Months", m),
            KpiValue::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// The fixed set of KPIs shown next to a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSet {
    /// Mean of the actual values
    pub avg_actual: KpiValue,
    /// Sum of the forecast values
    pub forecast_total: KpiValue,
    /// Mean forecast over the mean of the last `horizon` actuals, minus one, in percent
    pub expected_change_pct: KpiValue,
    /// Requested horizon
    pub horizon_months: KpiValue,
    /// `100 - MAPE` of the fit's one-step in-sample predictions
    pub model_accuracy_pct: KpiValue,
}

impl KpiSet {
    /// KPIs keyed by name
    pub fn as_map(&self) -> BTreeMap<&'static str, KpiValue> {
        BTreeMap::from([
            ("avg_actual", self.avg_actual),
            ("forecast_total", self.forecast_total),
            ("expected_change_pct", self.expected_change_pct),
            ("horizon_months", self.horizon_months),
            ("model_accuracy_pct", self.model_accuracy_pct),
        ])
    }
}

impl fmt::Display for KpiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Key Metrics:")?;
        writeln!(f, "  Avg Monthly Sales:       {}", self.avg_actual)?;
        writeln!(f, "  Forecasted Sales:        {}", self.forecast_total)?;
        writeln!(f, "  Expected Demand Change:  {}", self.expected_change_pct)?;
        writeln!(f, "  Forecast Horizon:        {}", self.horizon_months)?;
        writeln!(f, "  Model Accuracy:          {}", self.model_accuracy_pct)?;
        Ok(())
    }
}

/// Compute every KPI for the given inputs
pub fn compute(actual: &ActualSeries, forecast: &ForecastSeries, horizon: usize) -> KpiSet {
    KpiSet {
        avg_actual: average_actual(actual),
        forecast_total: KpiValue::Amount(forecast.total() as f64),
        expected_change_pct: expected_change_pct(actual, forecast, horizon),
        horizon_months: KpiValue::Months(horizon),
        model_accuracy_pct: model_accuracy_pct(forecast),
    }
}

fn average_actual(actual: &ActualSeries) -> KpiValue {
    match stats::mean(&actual.values()) {
        Ok(mean) if mean.is_finite() => KpiValue::Amount(mean),
        _ => KpiValue::NotAvailable,
    }
}

/// Compares the forecast mean against the trailing `horizon` actuals only,
/// never the whole-history mean.
fn expected_change_pct(
    actual: &ActualSeries,
    forecast: &ForecastSeries,
    horizon: usize,
) -> KpiValue {
    if horizon == 0 || actual.len() < horizon || forecast.is_empty() {
        return KpiValue::NotAvailable;
    }

    let recent = match stats::trailing_mean(&actual.values(), horizon) {
        Ok(mean) => mean,
        Err(_) => return KpiValue::NotAvailable,
    };
    let projected = match stats::mean(&forecast.values()) {
        Ok(mean) => mean,
        Err(_) => return KpiValue::NotAvailable,
    };
    if recent == 0.0 {
        return KpiValue::NotAvailable;
    }

    let change = (projected / recent - 1.0) * 100.0;
    if change.is_finite() {
        KpiValue::Percent(change)
    } else {
        KpiValue::NotAvailable
    }
}

fn model_accuracy_pct(forecast: &ForecastSeries) -> KpiValue {
    forecast
        .diagnostics()
        .and_then(|d| d.in_sample.as_ref())
        .and_then(|accuracy| accuracy.accuracy_pct())
        .map_or(KpiValue::NotAvailable, KpiValue::Percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn month(m: u32) -> Period {
        Period::new(2023, m).unwrap()
    }

    fn actual(values: &[f64]) -> ActualSeries {
        ActualSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (month(i as u32 + 1), v)),
        )
        .unwrap()
    }

    #[test]
    fn test_kpis_from_full_inputs() {
        let actual = actual(&[100.0, 110.0, 105.0, 120.0, 115.0, 130.0]);
        let forecast = ForecastSeries::following(month(6), &[130, 140, 150]).unwrap();

        let kpis = compute(&actual, &forecast, 3);
        assert_relative_eq!(kpis.avg_actual.as_f64().unwrap(), 680.0 / 6.0);
        assert_eq!(kpis.forecast_total, KpiValue::Amount(420.0));
        assert_eq!(kpis.horizon_months, KpiValue::Months(3));
        assert_eq!(kpis.model_accuracy_pct, KpiValue::NotAvailable);

        // Trailing window: (120 + 115 + 130) / 3; forecast mean 140
        let expected = (140.0 / (365.0 / 3.0) - 1.0) * 100.0;
        assert_relative_eq!(kpis.expected_change_pct.as_f64().unwrap(), expected);
    }

    #[test]
    fn test_expected_change_uses_trailing_window() {
        // Whole-history mean differs from the trailing mean
        let actual = actual(&[10.0, 10.0, 100.0, 100.0]);
        let forecast = ForecastSeries::following(month(4), &[100, 100]).unwrap();

        let kpis = compute(&actual, &forecast, 2);
        assert_relative_eq!(kpis.expected_change_pct.as_f64().unwrap(), 0.0);
    }

    #[rstest]
    #[case(3, 4)]
    #[case(0, 1)]
    #[case(5, 12)]
    fn test_expected_change_needs_horizon_actuals(#[case] len: usize, #[case] horizon: usize) {
        let values: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
        let actual = actual(&values);
        let forecast = ForecastSeries::following(month(12), &vec![100; horizon]).unwrap();

        let kpis = compute(&actual, &forecast, horizon);
        assert_eq!(kpis.expected_change_pct, KpiValue::NotAvailable);
    }

    #[test]
    fn test_empty_inputs() {
        let kpis = compute(&ActualSeries::empty(), &ForecastSeries::empty(), 6);
        assert_eq!(kpis.avg_actual, KpiValue::NotAvailable);
        assert_eq!(kpis.forecast_total, KpiValue::Amount(0.0));
        assert_eq!(kpis.expected_change_pct, KpiValue::NotAvailable);
        assert_eq!(kpis.horizon_months, KpiValue::Months(6));
    }

    #[test]
    fn test_empty_actual_with_forecast() {
        let forecast = ForecastSeries::following(month(1), &[5, 7]).unwrap();
        let kpis = compute(&ActualSeries::empty(), &forecast, 2);
        assert_eq!(kpis.avg_actual, KpiValue::NotAvailable);
        assert_eq!(kpis.forecast_total, KpiValue::Amount(12.0));
    }

    #[test]
    fn test_zero_trailing_mean() {
        let actual = actual(&[0.0, 0.0]);
        let forecast = ForecastSeries::following(month(2), &[1, 1]).unwrap();
        let kpis = compute(&actual, &forecast, 2);
        assert_eq!(kpis.expected_change_pct, KpiValue::NotAvailable);
    }

    #[rstest]
    #[case(KpiValue::Amount(113_333.4), "113,333")]
    #[case(KpiValue::Percent(4.5678), "4.57%")]
    #[case(KpiValue::Percent(-0.5), "-0.50%")]
    #[case(KpiValue::Months(6), "6 Months")]
    #[case(KpiValue::NotAvailable, "N/A")]
    fn test_display(#[case] value: KpiValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_as_map_names() {
        let kpis = compute(&ActualSeries::empty(), &ForecastSeries::empty(), 3);
        let keys: Vec<&str> = kpis.as_map().keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                "avg_actual",
                "expected_change_pct",
                "forecast_total",
                "horizon_months",
                "model_accuracy_pct"
            ]
        );
    }
}
