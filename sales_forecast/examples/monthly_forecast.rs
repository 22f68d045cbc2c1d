use sales_forecast::{
    run_batch, CsvSeriesStore, EngineConfig, ForecastCache, ForecastEngine, ForecastSession,
    Period,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sales_forecast=info".into()),
        )
        .init();

    let csv_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("examples")
        .join("csv");
    let out_dir = std::env::temp_dir().join("sales_forecast_demo");
    let store = CsvSeriesStore::new(
        csv_dir.join("monthly_sales.csv"),
        out_dir.join("forecast.csv"),
    );

    println!("Loading data from: {}", store.actuals_path().display());
    let config = EngineConfig::default();
    let cache = Arc::new(ForecastCache::from_config(&config));
    let engine = ForecastEngine::new(config)?;
    let mut session = ForecastSession::open(&store, engine.clone(), cache)?;

    println!("Last 12 months:");
    for observation in session.preview(12).iter() {
        println!("  {}  {:>10.0}", observation.period, observation.value);
    }

    // Forecast from 2024 only
    session.set_range(Some(Period::new(2024, 1)?), None);
    session.set_horizon(9)?;

    match session.forecast() {
        Some(forecast) => {
            println!("\nForecast for the next {} months:", forecast.len());
            for point in forecast.iter() {
                println!("  {}  {:>10}", point.period, point.value);
            }
        }
        None => match session.error() {
            Some(err) => println!("\nForecast unavailable: {}", err),
            None => println!("\nNo data in the selected range"),
        },
    }
    println!("\n{}", session.kpis());

    let saved = run_batch(&store, &engine)?;
    println!(
        "Saved {} months to {}",
        saved.len(),
        store.forecast_path().display()
    );

    Ok(())
}
