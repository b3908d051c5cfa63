//! Fairway route planning HTTP service.
//!
//! # Configuration
//!
//! - `FAIRWAY_DATA_PATH` - port catalog JSON file (default `/data/ports.json`)
//! - `SERVICE_PORT` - HTTP port (default 8080)
//! - `LOG_FORMAT` - `json` (default) or `text`
//! - `RUST_LOG` - log level filter (default `info`)
//! - `FAIRWAY_*` - planner tunables, see `fairway_lib::PlannerConfig`

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};

use fairway_lib::PlannerConfig;
use fairway_service::{init_logging, init_metrics, router, AppState, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::from_env());

    if let Err(e) = init_metrics() {
        // Metrics are optional; the service runs without them.
        tracing::warn!(error = %e, "metrics initialization failed, continuing");
    }

    let data_path =
        env::var("FAIRWAY_DATA_PATH").unwrap_or_else(|_| "/data/ports.json".to_string());
    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let config = PlannerConfig::from_env();

    info!(data_path = %data_path, port = port, "starting fairway service");

    // A disconnected or unloadable catalog is fatal at startup.
    let state = AppState::load(&data_path, config).map_err(|e| {
        error!(error = %e, path = %data_path, "failed to initialize application state");
        e
    })?;
    info!(state = ?state, "application state ready");

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
