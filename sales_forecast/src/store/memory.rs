//! In-process series store

use super::{SeriesStore, StoreError};
use crate::series::{ActualSeries, ForecastSeries};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Holds both series in memory
#[derive(Debug, Default)]
pub struct MemorySeriesStore {
    actuals: RwLock<ActualSeries>,
    forecast: RwLock<ForecastSeries>,
}

impl MemorySeriesStore {
    pub fn new(actuals: ActualSeries) -> Self {
        Self {
            actuals: RwLock::new(actuals),
            forecast: RwLock::new(ForecastSeries::empty()),
        }
    }

    /// Replace the stored actuals, e.g. after new months arrive
    pub fn replace_actuals(&self, actuals: ActualSeries) {
        *self.actuals.write().unwrap_or_else(PoisonError::into_inner) = actuals;
    }
}

impl SeriesStore for MemorySeriesStore {
    fn load_actuals(&self) -> Result<ActualSeries, StoreError> {
        let actuals = self
            .actuals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(rows = actuals.len(), "loaded actuals from memory");
        Ok(actuals)
    }

    fn load_forecast(&self) -> Result<ForecastSeries, StoreError> {
        Ok(self
            .forecast
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_forecast(&self, forecast: &ForecastSeries) -> Result<(), StoreError> {
        *self.forecast.write().unwrap_or_else(PoisonError::into_inner) = forecast.clone();
        debug!(rows = forecast.len(), "saved forecast to memory");
        Ok(())
    }
}
