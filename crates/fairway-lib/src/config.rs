//! Planner configuration.
//!
//! Every tunable of the route computation subsystem lives here with its
//! default. The service builds one `PlannerConfig` at startup (environment
//! overrides applied) and passes it into constructors explicitly; there is no
//! ambient configuration state.

use std::time::Duration;

/// Configuration for the route planning core.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Compute semaphore ceiling.
    pub max_concurrent_calculations: usize,
    /// Hard cap applied when a request omits its own timeout.
    pub default_request_timeout: Duration,
    /// TTL for positive route responses.
    pub route_cache_ttl: Duration,
    /// k-NN fan-out in graph build.
    pub graph_k_nearest: usize,
    /// Number of hub nodes.
    pub graph_hub_count: usize,
    /// Radius cap for k-NN edges, nautical miles.
    pub graph_knn_radius_nm: f64,
    /// Radius cap for hub edges, nautical miles.
    pub graph_hub_radius_nm: f64,
    /// Alternative pruning multiplier over the primary cost.
    pub pathfinder_alt_cost_ratio: f64,
    /// Node expansions between cancellation checks.
    pub pathfinder_cancel_check_interval: usize,
    /// How long an overflowing request waits for a compute slot.
    pub overload_wait: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calculations: 64,
            default_request_timeout: Duration::from_secs(30),
            route_cache_ttl: Duration::from_secs(1800),
            graph_k_nearest: 8,
            graph_hub_count: 40,
            graph_knn_radius_nm: 1500.0,
            graph_hub_radius_nm: 6000.0,
            pathfinder_alt_cost_ratio: 1.5,
            pathfinder_cancel_check_interval: 4096,
            overload_wait: Duration::from_millis(2000),
        }
    }
}

impl PlannerConfig {
    /// Build a configuration from `FAIRWAY_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse::<usize>("FAIRWAY_MAX_CONCURRENT") {
            config.max_concurrent_calculations = v.max(1);
        }
        if let Some(v) = env_parse::<u64>("FAIRWAY_REQUEST_TIMEOUT_S") {
            config.default_request_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<u64>("FAIRWAY_ROUTE_CACHE_TTL_S") {
            config.route_cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<usize>("FAIRWAY_GRAPH_K") {
            config.graph_k_nearest = v;
        }
        if let Some(v) = env_parse::<usize>("FAIRWAY_GRAPH_HUBS") {
            config.graph_hub_count = v;
        }
        if let Some(v) = env_parse::<f64>("FAIRWAY_GRAPH_KNN_RADIUS_NM") {
            config.graph_knn_radius_nm = v;
        }
        if let Some(v) = env_parse::<f64>("FAIRWAY_GRAPH_HUB_RADIUS_NM") {
            config.graph_hub_radius_nm = v;
        }
        if let Some(v) = env_parse::<f64>("FAIRWAY_ALT_COST_RATIO") {
            config.pathfinder_alt_cost_ratio = v;
        }
        if let Some(v) = env_parse::<usize>("FAIRWAY_CANCEL_CHECK_INTERVAL") {
            config.pathfinder_cancel_check_interval = v.max(1);
        }
        if let Some(v) = env_parse::<u64>("FAIRWAY_OVERLOAD_WAIT_MS") {
            config.overload_wait = Duration::from_millis(v);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let c = PlannerConfig::default();
        assert_eq!(c.max_concurrent_calculations, 64);
        assert_eq!(c.default_request_timeout, Duration::from_secs(30));
        assert_eq!(c.route_cache_ttl, Duration::from_secs(1800));
        assert_eq!(c.graph_k_nearest, 8);
        assert_eq!(c.graph_hub_count, 40);
        assert_eq!(c.graph_knn_radius_nm, 1500.0);
        assert_eq!(c.graph_hub_radius_nm, 6000.0);
        assert_eq!(c.pathfinder_alt_cost_ratio, 1.5);
        assert_eq!(c.pathfinder_cancel_check_interval, 4096);
        assert_eq!(c.overload_wait, Duration::from_millis(2000));
    }
}
