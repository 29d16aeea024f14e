//! True Anomaly API server
//!
//! Loads an event snapshot and serves burst / gap analytics over HTTP.

use anomaly_lib::{fixtures, EventStore, InMemoryEventStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use true_anomaly_server::{api, config::ServerConfig};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = SERVER_VERSION, "Starting true-anomaly-server");

    let config = ServerConfig::load()?;
    info!(api_port = config.api_port, "Server configured");

    let store = load_store(&config)?;
    let app_state = Arc::new(api::AppState::new(store, config.default_params()));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            result.context("API server task panicked")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!(reason = "SIGINT received", "Shutting down");
        }
    }

    Ok(())
}

fn load_store(config: &ServerConfig) -> Result<Arc<dyn EventStore>> {
    let store = match (&config.events_path, config.seed_demo_events) {
        (Some(path), _) => InMemoryEventStore::from_json_file(path)
            .with_context(|| format!("Failed to load events from {}", path))?,
        (None, true) => {
            info!("Serving demo events");
            InMemoryEventStore::new(fixtures::seed_test_events(fixtures::demo_base()))
        }
        (None, false) => {
            warn!("No events_path configured; every stream will be empty");
            InMemoryEventStore::default()
        }
    };

    info!(events = store.len(), "Event snapshot ready");
    let store: Arc<dyn EventStore> = Arc::new(store);
    Ok(store)
}
