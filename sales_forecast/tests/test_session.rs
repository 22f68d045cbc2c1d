use pretty_assertions::assert_eq;
use sales_forecast::{
    ActualSeries, CsvSeriesStore, EngineConfig, ForecastCache, ForecastEngine, ForecastError,
    ForecastSession, ForecastState, KpiValue, MemorySeriesStore, ModelSpec, Period, SeriesStore,
    StoreError,
};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

fn history() -> ActualSeries {
    let values = [
        120.0, 125.0, 118.0, 130.0, 128.0, 140.0, 135.0, 150.0, 142.0, 155.0, 149.0, 162.0,
    ];
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

struct BrokenStore;

impl SeriesStore for BrokenStore {
    fn load_actuals(&self) -> Result<ActualSeries, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn load_forecast(&self) -> Result<sales_forecast::ForecastSeries, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn save_forecast(&self, _: &sales_forecast::ForecastSeries) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[test]
fn test_concurrent_sessions_share_one_fit() {
    let cache = Arc::new(ForecastCache::new(4));
    let barrier = Arc::new(Barrier::new(6));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let session = ForecastSession::new(history(), engine(), cache);
                session.forecast().cloned()
            })
        })
        .collect();

    let forecasts: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    for forecast in &forecasts[1..] {
        assert_eq!(forecast, &forecasts[0]);
    }
    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 5);
}

#[test]
fn test_session_matches_direct_forecast() {
    let session = ForecastSession::new(history(), engine(), Arc::new(ForecastCache::default()));
    let direct = engine().forecast(&history(), 6, &ModelSpec::SALES).unwrap();

    assert_eq!(session.forecast(), Some(&direct));
    assert_eq!(session.kpis().forecast_total, KpiValue::Amount(direct.total() as f64));
}

#[test]
fn test_open_and_reload_from_csv() {
    let dir = tempdir().unwrap();
    let actuals = dir.path().join("monthly_sales.csv");
    std::fs::write(
        &actuals,
        "month,total_sales\n2023-01-01,100\n2023-02-01,110\n2023-03-01,105\n",
    )
    .unwrap();
    let store = CsvSeriesStore::new(&actuals, dir.path().join("forecast.csv"));

    let mut session =
        ForecastSession::open(&store, engine(), Arc::new(ForecastCache::default())).unwrap();
    assert_eq!(session.history().len(), 3);
    assert!(matches!(
        session.error(),
        Some(ForecastError::InsufficientData { got: 3, .. })
    ));

    std::fs::write(
        &actuals,
        "month,total_sales\n2023-01-01,100\n2023-02-01,110\n2023-03-01,105\n2023-04-01,120\n2023-05-01,115\n2023-06-01,130\n",
    )
    .unwrap();
    session.reload(&store).unwrap();
    assert_eq!(session.history().len(), 6);
    assert!(matches!(session.forecast_state(), ForecastState::Ready(_)));
}

#[test]
fn test_open_reports_store_failure() {
    let err = ForecastSession::open(&BrokenStore, engine(), Arc::new(ForecastCache::default()))
        .unwrap_err();
    assert!(matches!(err, ForecastError::StoreUnavailable(_)));
}

#[test]
fn test_reload_picks_up_new_months() {
    let store = MemorySeriesStore::new(history().tail(6));
    let mut session =
        ForecastSession::open(&store, engine(), Arc::new(ForecastCache::default())).unwrap();
    let before = session.forecast().unwrap().first_period();
    assert_eq!(before, Some(Period::new(2024, 1).unwrap()));

    let mut extended: Vec<_> = history().iter().map(|o| (o.period, o.value)).collect();
    extended.push((Period::new(2024, 1).unwrap(), 170.0));
    store.replace_actuals(ActualSeries::from_pairs(extended).unwrap());

    session.reload(&store).unwrap();
    assert_eq!(
        session.forecast().unwrap().first_period(),
        Some(Period::new(2024, 2).unwrap())
    );
}

#[test]
fn test_configured_cache_capacity_bounds_session_cache() {
    let config = EngineConfig::from_json_str(r#"{"cache_capacity": 1}"#).unwrap();
    let cache = Arc::new(ForecastCache::from_config(&config));
    let engine = ForecastEngine::new(config).unwrap();
    let mut session = ForecastSession::new(history(), engine, Arc::clone(&cache));

    session.set_horizon(3).unwrap();
    session.set_horizon(4).unwrap();

    assert_eq!(cache.capacity(), 1);
    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.evictions, 2);
    assert_eq!(stats.misses, 3);
}
