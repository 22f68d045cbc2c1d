//! # Sales Forecast
//!
//! A Rust library for monthly sales forecasting and KPI reporting.
//!
//! ## Features
//!
//! - Monthly series with validated, strictly increasing periods
//! - Inclusive date-range filtering
//! - ARMA(1,0,1) forecasting with deterministic, bounded fits
//! - KPIs derived from actuals and forecast (average, total, expected change)
//! - A shared, thread-safe forecast cache keyed by the exact model inputs
//! - CSV and in-memory series stores, plus a batch run that saves forecasts
//!
//! ## Quick Start
//!
//! ```rust
//! use sales_forecast::{
//!     ActualSeries, EngineConfig, ForecastCache, ForecastEngine, ForecastSession, Period,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let history = ActualSeries::from_pairs(vec![
//!     (Period::new(2023, 1)?, 100.0),
//!     (Period::new(2023, 2)?, 110.0),
//!     (Period::new(2023, 3)?, 105.0),
//!     (Period::new(2023, 4)?, 120.0),
//!     (Period::new(2023, 5)?, 115.0),
//!     (Period::new(2023, 6)?, 130.0),
//! ])?;
//!
//! let engine = ForecastEngine::new(EngineConfig::default())?;
//! let mut session = ForecastSession::new(history, engine, Arc::new(ForecastCache::default()));
//! session.set_horizon(3)?;
//!
//! let forecast = session.forecast().expect("six months is enough to fit");
//! assert_eq!(forecast.first_period(), Some(Period::new(2023, 7)?));
//! println!("{}", session.kpis());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod models;
pub mod period;
pub mod series;
pub mod session;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use crate::batch::run_batch;
pub use crate::cache::{CacheResult, CacheStats, ForecastCache};
pub use crate::config::EngineConfig;
pub use crate::engine::ForecastEngine;
pub use crate::error::{ForecastError, Result};
pub use crate::filter::{filter, DateRange};
pub use crate::metrics::{KpiSet, KpiValue};
pub use crate::models::{FitDiagnostics, ModelSpec};
pub use crate::period::Period;
pub use crate::series::{ActualSeries, ForecastPoint, ForecastSeries, Observation};
pub use crate::session::{ForecastSession, ForecastState};
pub use crate::store::{CsvSeriesStore, MemorySeriesStore, SeriesStore, StoreError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
