//! Persistence boundary for actual and forecast series
//!
//! A [`SeriesStore`] hands out series ordered by period and replaces the
//! stored forecast wholesale on save. Store failures are reported as
//! [`StoreError`] and reach callers wrapped once in
//! `ForecastError::StoreUnavailable`.

use crate::series::{ActualSeries, ForecastSeries};
use thiserror::Error;

pub mod csv_store;
pub mod memory;

pub use csv_store::CsvSeriesStore;
pub use memory::MemorySeriesStore;

/// Failures reported by a series store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file or device failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A stored row could not be turned into a series entry
    #[error("Malformed row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    /// The stored series as a whole is inconsistent
    #[error("Invalid stored series: {0}")]
    InvalidSeries(String),

    /// The backend cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Source of actuals and sink for forecasts
pub trait SeriesStore {
    /// Observed monthly totals, oldest first
    fn load_actuals(&self) -> Result<ActualSeries, StoreError>;

    /// The last saved forecast, oldest first; empty if none was saved
    fn load_forecast(&self) -> Result<ForecastSeries, StoreError>;

    /// Replace the stored forecast with `forecast`
    fn save_forecast(&self, forecast: &ForecastSeries) -> Result<(), StoreError>;
}
