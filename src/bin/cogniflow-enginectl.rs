//! Cogniflow Engine control binary.
//!
//! Wires the timeline store, aggregator, policy listener, and tick driver
//! together and runs the inference loop. Stands in for the out-of-scope
//! HTTP transport during local testing by seeding a few simulated events
//! before the loop starts.

use std::sync::Arc;
use std::time::Duration;

use cogniflow_engine::config::Config;
use cogniflow_engine::policy::LoggingPolicyListener;
use cogniflow_engine::telemetry::event::now_secs;
use cogniflow_engine::telemetry::{TelemetryAggregator, TelemetryEvent, TickDriver, TimelineStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = Config::load()?;
    tracing::info!(data_dir = ?config.data_dir, interval_ms = config.inference_interval_ms, "starting cogniflow engine");

    let timeline = Arc::new(TimelineStore::open(config.timeline_db_path())?);
    let aggregator = Arc::new(TelemetryAggregator::new(timeline.clone(), config.load_history_window_s));
    aggregator.register_listener(Box::new(LoggingPolicyListener::new()));

    seed_demo_events(&aggregator);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let driver = TickDriver::new(Duration::from_millis(config.inference_interval_ms));
    let driver_aggregator = aggregator.clone();
    let driver_task = tokio::spawn(async move { driver.run(driver_aggregator, shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    shutdown_tx.send(true)?;
    driver_task.await?;

    Ok(())
}

/// Push a handful of representative events so a fresh run has something to
/// show on its first tick, in lieu of the out-of-scope transport layer that
/// would normally feed this.
fn seed_demo_events(aggregator: &TelemetryAggregator) {
    let now = now_secs();
    aggregator.push_event(TelemetryEvent::new("ide", "keystroke", now));
    aggregator.push_event(TelemetryEvent::new("ide", "file_save", now));
    aggregator.push_event(TelemetryEvent::new("desktop", "window_change", now));
}
