//! HTTP surface for the fairway route planning service.
//!
//! All business logic lives in `fairway-lib`; this crate provides the axum
//! glue: request DTO validation, the error envelope, health checks, metrics,
//! logging, and request-id propagation.
//!
//! # Endpoints
//!
//! - `POST /routes/calculate` - compute a route with alternatives
//! - `POST /routes/validate` - validation only
//! - `GET /ports/search` - ranked port text search
//! - `GET /ports/{code}` - port lookup
//! - `GET /health` - liveness and backend reachability
//! - `GET /metrics` - Prometheus exposition

#![deny(warnings)]

pub mod envelope;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod request;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use envelope::ErrorEnvelope;
pub use health::{health_handler, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{init_metrics, metrics_handler};
pub use middleware::{extract_or_generate_request_id, RequestId, TelemetryLayer};
pub use request::{PortSearchQuery, Validate};
pub use state::AppState;

/// Build the service router over an application state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/routes/calculate", post(routes::calculate_handler))
        .route("/routes/validate", post(routes::validate_handler))
        .route("/ports/search", get(routes::port_search_handler))
        .route("/ports/{code}", get(routes::port_get_handler))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(TelemetryLayer)
        .with_state(state)
}
