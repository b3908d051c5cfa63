//! Prometheus metrics for the route service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Errors from metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => write!(f, "failed to install metrics recorder: {e}"),
        }
    }
}

impl std::error::Error for MetricsError {}

/// Install the Prometheus recorder. Call once at startup.
pub fn init_metrics() -> Result<(), MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// `GET /metrics` handler: Prometheus exposition text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# metrics not initialized\n".to_string())
}

/// Record a completed route calculation.
pub fn record_route_calculated(criterion: &str, cache_hit: bool) {
    metrics::counter!(
        "fairway_routes_calculated_total",
        "criterion" => criterion.to_string(),
        "cache" => if cache_hit { "hit" } else { "miss" }
    )
    .increment(1);
}

/// Record a failed route calculation by error kind.
pub fn record_route_failed(kind: &str) {
    metrics::counter!(
        "fairway_routes_failed_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record the hop count of the primary route.
pub fn record_route_hops(hops: usize, criterion: &str) {
    metrics::histogram!(
        "fairway_route_hops",
        "criterion" => criterion.to_string()
    )
    .record(hops as f64);
}

/// Record the number of alternatives explored for a calculation.
pub fn record_alternatives_returned(count: usize) {
    metrics::histogram!("fairway_route_alternatives").record(count as f64);
}
