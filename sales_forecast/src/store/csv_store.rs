//! CSV-file series store
//!
//! Actuals are read from a `month,total_sales` file and forecasts are kept
//! in a `month,forecast_sales` file. Months may be any date-like text and
//! are normalised to periods on load.

use super::{SeriesStore, StoreError};
use crate::period::Period;
use crate::series::{ActualSeries, ForecastPoint, ForecastSeries, Observation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ActualRow {
    month: String,
    total_sales: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ForecastRow {
    month: String,
    forecast_sales: f64,
}

/// Series store backed by two CSV files
#[derive(Debug, Clone)]
pub struct CsvSeriesStore {
    actuals_path: PathBuf,
    forecast_path: PathBuf,
}

impl CsvSeriesStore {
    pub fn new<A: AsRef<Path>, F: AsRef<Path>>(actuals_path: A, forecast_path: F) -> Self {
        Self {
            actuals_path: actuals_path.as_ref().to_path_buf(),
            forecast_path: forecast_path.as_ref().to_path_buf(),
        }
    }

    pub fn actuals_path(&self) -> &Path {
        &self.actuals_path
    }

    pub fn forecast_path(&self) -> &Path {
        &self.forecast_path
    }

    /// Sibling file the next forecast is staged in before it replaces the old one
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .forecast_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.forecast_path.with_file_name(name)
    }
}

fn write_forecast_rows(path: &Path, forecast: &ForecastSeries) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in forecast.iter() {
        writer.serialize(ForecastRow {
            month: point.period.to_string(),
            forecast_sales: point.value as f64,
        })?;
    }
    // An empty forecast still gets a header row
    if forecast.is_empty() {
        writer.write_record(["month", "forecast_sales"])?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_period(row: usize, month: &str) -> Result<Period, StoreError> {
    Period::parse(month).map_err(|e| StoreError::Malformed {
        row,
        reason: e.to_string(),
    })
}

impl SeriesStore for CsvSeriesStore {
    fn load_actuals(&self) -> Result<ActualSeries, StoreError> {
        let mut observations = Vec::new();
        {
            let mut reader = csv::Reader::from_path(&self.actuals_path)?;
            for (i, record) in reader.deserialize::<ActualRow>().enumerate() {
                let row = record?;
                observations.push(Observation::new(
                    parse_period(i + 1, &row.month)?,
                    row.total_sales,
                ));
            }
        }

        observations.sort_by_key(|o| o.period);
        let actuals =
            ActualSeries::new(observations).map_err(|e| StoreError::InvalidSeries(e.to_string()))?;

        debug!(
            path = %self.actuals_path.display(),
            rows = actuals.len(),
            "loaded actuals"
        );
        Ok(actuals)
    }

    fn load_forecast(&self) -> Result<ForecastSeries, StoreError> {
        if !self.forecast_path.exists() {
            return Ok(ForecastSeries::empty());
        }

        let mut points = Vec::new();
        {
            let mut reader = csv::Reader::from_path(&self.forecast_path)?;
            for (i, record) in reader.deserialize::<ForecastRow>().enumerate() {
                let row = record?;
                let value = row.forecast_sales;
                if !value.is_finite() || value.fract() != 0.0 {
                    return Err(StoreError::Malformed {
                        row: i + 1,
                        reason: format!("forecast value {} is not a whole number", value),
                    });
                }
                points.push(ForecastPoint {
                    period: parse_period(i + 1, &row.month)?,
                    value: value as i64,
                });
            }
        }

        points.sort_by_key(|p| p.period);
        let forecast =
            ForecastSeries::new(points).map_err(|e| StoreError::InvalidSeries(e.to_string()))?;

        debug!(
            path = %self.forecast_path.display(),
            rows = forecast.len(),
            "loaded forecast"
        );
        Ok(forecast)
    }

    fn save_forecast(&self, forecast: &ForecastSeries) -> Result<(), StoreError> {
        if let Some(parent) = self.forecast_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.staging_path();
        if let Err(e) = write_forecast_rows(&staging, forecast) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        fs::rename(&staging, &self.forecast_path)?;

        info!(
            path = %self.forecast_path.display(),
            rows = forecast.len(),
            "saved forecast"
        );
        Ok(())
    }
}
