//! # Sales Forecast Workspace
//!
//! Umbrella crate for the workspace. It re-exports the member crates so
//! applications can depend on a single package.
//!
//! ## Example
//!
//! ```
//! use sales_forecast_workspace::forecast::{EngineConfig, ForecastEngine, ModelSpec};
//!
//! let engine = ForecastEngine::new(EngineConfig::default()).unwrap();
//! assert_eq!(engine.max_horizon(), 12);
//! assert_eq!(ModelSpec::SALES.to_string(), "ARIMA(1,0,1)");
//! ```

/// Forecasting, filtering, KPIs and storage
pub use sales_forecast as forecast;

/// Statistics and optimisation helpers
pub use sales_math as math;
