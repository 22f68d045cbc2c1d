//! Non-interactive forecast run: load the full history, forecast, save.

use crate::engine::ForecastEngine;
use crate::error::Result;
use crate::models::ModelSpec;
use crate::series::ForecastSeries;
use crate::store::SeriesStore;
use tracing::info;

/// Forecast the store's full history over the configured default horizon
/// and replace the stored forecast with the result.
///
/// Runs uncached. A store failure or a failed fit aborts the run before
/// anything is saved.
pub fn run_batch<S: SeriesStore + ?Sized>(
    store: &S,
    engine: &ForecastEngine,
) -> Result<ForecastSeries> {
    let history = store.load_actuals()?;
    let horizon = engine.config().default_horizon;

    let forecast = engine.forecast(&history, horizon, &ModelSpec::SALES)?;
    store.save_forecast(&forecast)?;

    info!(
        observations = history.len(),
        horizon,
        total = forecast.total(),
        "batch forecast saved"
    );
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::ForecastError;
    use crate::period::Period;
    use crate::series::ActualSeries;
    use crate::store::{MemorySeriesStore, StoreError};
    use pretty_assertions::assert_eq;

    struct OfflineStore;

    impl SeriesStore for OfflineStore {
        fn load_actuals(&self) -> std::result::Result<ActualSeries, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn load_forecast(&self) -> std::result::Result<ForecastSeries, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn save_forecast(&self, _: &ForecastSeries) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn history() -> ActualSeries {
        let values = [100.0, 110.0, 105.0, 120.0, 115.0, 130.0];
        ActualSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (Period::new(2023, i as u32 + 1).unwrap(), v)),
        )
        .unwrap()
    }

    fn engine() -> ForecastEngine {
        ForecastEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_batch_saves_default_horizon() {
        let store = MemorySeriesStore::new(history());
        let forecast = run_batch(&store, &engine()).unwrap();

        assert_eq!(forecast.len(), 6);
        assert_eq!(forecast.first_period(), Some(Period::new(2023, 7).unwrap()));
        assert_eq!(store.load_forecast().unwrap(), forecast);
    }

    #[test]
    fn test_batch_rerun_replaces_forecast() {
        let store = MemorySeriesStore::new(history());
        let first = run_batch(&store, &engine()).unwrap();
        let second = run_batch(&store, &engine()).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.load_forecast().unwrap().len(), 6);
    }

    #[test]
    fn test_store_failure_propagates() {
        let err = run_batch(&OfflineStore, &engine()).unwrap_err();
        assert!(matches!(err, ForecastError::StoreUnavailable(_)));
    }

    #[test]
    fn test_failed_fit_saves_nothing() {
        let short = history().tail(3);
        let store = MemorySeriesStore::new(short);

        let err = run_batch(&store, &engine()).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { got: 3, .. }));
        assert!(store.load_forecast().unwrap().is_empty());
    }
}
