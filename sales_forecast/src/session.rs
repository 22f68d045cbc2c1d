//! Interactive forecasting session
//!
//! A session owns the loaded history plus the two user-controlled
//! parameters (date range and horizon). Every change runs
//! filter -> cached forecast -> KPIs again, so the view never mixes results
//! from different inputs.

use crate::cache::ForecastCache;
use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};
use crate::filter::DateRange;
use crate::metrics::{self, KpiSet};
use crate::models::ModelSpec;
use crate::period::Period;
use crate::series::{ActualSeries, ForecastSeries};
use crate::store::SeriesStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of the latest forecast request
#[derive(Debug)]
pub enum ForecastState {
    /// Forecast for the current range and horizon
    Ready(Arc<ForecastSeries>),
    /// The range selects no history; nothing to forecast
    NoData,
    /// The engine rejected the selected history
    Failed(Arc<ForecastError>),
}

/// State behind one interactive view
#[derive(Debug)]
pub struct ForecastSession {
    engine: ForecastEngine,
    cache: Arc<ForecastCache>,
    model: ModelSpec,
    history: ActualSeries,
    range: DateRange,
    horizon: usize,
    actuals: ActualSeries,
    forecast: ForecastState,
    kpis: KpiSet,
}

impl ForecastSession {
    /// Start a session over `history` with the default horizon and no bounds
    pub fn new(history: ActualSeries, engine: ForecastEngine, cache: Arc<ForecastCache>) -> Self {
        let horizon = engine.config().default_horizon;
        let mut session = Self {
            engine,
            cache,
            model: ModelSpec::SALES,
            history,
            range: DateRange::unbounded(),
            horizon,
            actuals: ActualSeries::empty(),
            forecast: ForecastState::NoData,
            kpis: metrics::compute(&ActualSeries::empty(), &ForecastSeries::empty(), horizon),
        };
        session.recompute();
        session
    }

    /// Start a session over the actuals held by `store`
    pub fn open<S: SeriesStore + ?Sized>(
        store: &S,
        engine: ForecastEngine,
        cache: Arc<ForecastCache>,
    ) -> Result<Self> {
        let history = store.load_actuals()?;
        Ok(Self::new(history, engine, cache))
    }

    /// Replace the history with a fresh load from `store`, keeping the parameters
    pub fn reload<S: SeriesStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        self.history = store.load_actuals()?;
        self.recompute();
        Ok(())
    }

    /// Set the inclusive date bounds
    pub fn set_range(&mut self, start: Option<Period>, end: Option<Period>) {
        self.range = DateRange::new(start, end);
        self.recompute();
    }

    /// Set the forecast horizon. An invalid horizon is rejected and leaves
    /// the current view untouched.
    pub fn set_horizon(&mut self, horizon: usize) -> Result<()> {
        self.engine.validate_horizon(horizon)?;
        self.horizon = horizon;
        self.recompute();
        Ok(())
    }

    /// Full loaded history
    pub fn history(&self) -> &ActualSeries {
        &self.history
    }

    /// History inside the current date range
    pub fn actuals(&self) -> &ActualSeries {
        &self.actuals
    }

    /// The last `n` months of the full history
    pub fn preview(&self, n: usize) -> ActualSeries {
        self.history.tail(n)
    }

    /// Current forecast, if one could be produced
    pub fn forecast(&self) -> Option<&ForecastSeries> {
        match &self.forecast {
            ForecastState::Ready(forecast) => Some(forecast.as_ref()),
            _ => None,
        }
    }

    pub fn forecast_state(&self) -> &ForecastState {
        &self.forecast
    }

    /// Engine failure behind the current view, if any
    pub fn error(&self) -> Option<&ForecastError> {
        match &self.forecast {
            ForecastState::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    pub fn kpis(&self) -> &KpiSet {
        &self.kpis
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    fn recompute(&mut self) {
        let actuals = self.range.apply(&self.history);
        let horizon = self.horizon;

        let state = if actuals.is_empty() {
            ForecastState::NoData
        } else {
            let engine = &self.engine;
            let model = &self.model;
            match self.cache.get_or_compute(&actuals, horizon, model, || {
                engine.forecast(&actuals, horizon, model)
            }) {
                Ok(forecast) => ForecastState::Ready(forecast),
                Err(err) => {
                    warn!(error = %err, rows = actuals.len(), horizon, "forecast failed");
                    ForecastState::Failed(err)
                }
            }
        };

        self.kpis = match &state {
            ForecastState::Ready(forecast) => metrics::compute(&actuals, forecast, horizon),
            _ => metrics::compute(&actuals, &ForecastSeries::empty(), horizon),
        };
        debug!(
            rows = actuals.len(),
            horizon,
            ready = matches!(state, ForecastState::Ready(_)),
            "session recomputed"
        );
        self.actuals = actuals;
        self.forecast = state;
    }
}
