//! Health endpoint: liveness plus backend reachability.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check status per dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Error,
}

/// Health report for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ports_loaded: usize,
    pub catalog_version: u64,
    pub checks: HashMap<String, CheckStatus>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.checks.values().all(|c| *c == CheckStatus::Ok)
    }
}

/// `GET /health`: 200 when the catalog is loaded and backends respond,
/// 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshots().snapshot();

    let mut checks = HashMap::new();
    checks.insert(
        "catalog".to_string(),
        if snapshot.catalog.is_empty() {
            CheckStatus::Error
        } else {
            CheckStatus::Ok
        },
    );
    checks.insert(
        "graph".to_string(),
        if snapshot.graph.edge_count() > 0 {
            CheckStatus::Ok
        } else {
            CheckStatus::Error
        },
    );
    checks.insert(
        "cache".to_string(),
        if state.cache_reachable() {
            CheckStatus::Ok
        } else {
            CheckStatus::Error
        },
    );

    let mut status = HealthStatus {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        ports_loaded: snapshot.catalog.len(),
        catalog_version: snapshot.catalog.version(),
        checks,
    };

    if status.is_healthy() {
        (StatusCode::OK, Json(status)).into_response()
    } else {
        status.status = "unhealthy".to_string();
        (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_rollup() {
        let mut checks = HashMap::new();
        checks.insert("catalog".to_string(), CheckStatus::Ok);
        checks.insert("cache".to_string(), CheckStatus::Ok);
        let healthy = HealthStatus {
            status: "ok".into(),
            service: "fairway-service".into(),
            version: "0.0.0".into(),
            uptime_seconds: 1,
            ports_loaded: 10,
            catalog_version: 1,
            checks: checks.clone(),
        };
        assert!(healthy.is_healthy());

        checks.insert("cache".to_string(), CheckStatus::Error);
        let unhealthy = HealthStatus { checks, ..healthy };
        assert!(!unhealthy.is_healthy());
    }
}
