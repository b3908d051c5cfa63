//! Coordinator concurrency behavior: single-flight, overload, degradation.

use std::sync::{Arc, Barrier};
use std::time::Duration;

use fairway_lib::analytics::CountingSink;
use fairway_lib::cache::{MemoryCache, RouteCache};
use fairway_lib::test_helpers::{
    catalog_from, port_at, route_request, scenario_config, scenario_store, store_for,
};
use fairway_lib::{
    CostModel, Error, InMemoryRepository, PlannerConfig, RouteCoordinator, SnapshotStore,
};

fn coordinator_with(
    store: Arc<SnapshotStore>,
    cache: Arc<dyn RouteCache>,
    sink: Arc<CountingSink>,
    config: PlannerConfig,
) -> RouteCoordinator {
    RouteCoordinator::new(
        store.clone(),
        Arc::new(InMemoryRepository::new(store)),
        cache,
        sink,
        CostModel::default(),
        config,
    )
}

/// Cache that makes two concurrent lookups rendezvous, guaranteeing both
/// requests are past the cache check before either registers in flight.
struct RendezvousCache {
    inner: MemoryCache,
    barrier: Barrier,
}

impl RouteCache for RendezvousCache {
    fn get(&self, key: &str) -> fairway_lib::Result<Option<Vec<u8>>> {
        self.barrier.wait();
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> fairway_lib::Result<()> {
        self.inner.put(key, value, ttl)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_requests_compute_once() {
    let sink = Arc::new(CountingSink::new());
    let cache = Arc::new(RendezvousCache {
        inner: MemoryCache::new(),
        barrier: Barrier::new(2),
    });
    let coordinator = Arc::new(coordinator_with(
        scenario_store(),
        cache,
        sink.clone(),
        scenario_config(),
    ));

    // A wide request keeps the compute phase busy well past the rendezvous,
    // so the second arrival reliably finds the in-flight entry.
    let mut request = route_request("SGSIN", "NLRTM");
    request.max_alternative_routes = 8;
    request.max_connecting_ports = 8;

    let a = {
        let (coordinator, request) = (coordinator.clone(), request.clone());
        tokio::spawn(async move { coordinator.calculate(request).await })
    };
    let b = {
        let (coordinator, request) = (coordinator.clone(), request.clone());
        tokio::spawn(async move { coordinator.calculate(request).await })
    };

    let first = a.await.unwrap().unwrap();
    let second = b.await.unwrap().unwrap();

    // Both callers observe the same response, computed exactly once.
    assert_eq!(first, second);
    let stats = coordinator.stats();
    assert_eq!(stats.pathfinder_executions, 1, "single-flight violated");
    assert_eq!(stats.singleflight_joins, 1);
}

#[tokio::test]
async fn cache_miss_then_hit_on_identical_request() {
    let sink = Arc::new(CountingSink::new());
    let coordinator = coordinator_with(
        scenario_store(),
        Arc::new(MemoryCache::new()),
        sink.clone(),
        scenario_config(),
    );

    let first = coordinator
        .calculate(route_request("SGSIN", "NLRTM"))
        .await
        .unwrap();
    assert!(!first.cache_hit);

    let second = coordinator
        .calculate(route_request("SGSIN", "NLRTM"))
        .await
        .unwrap();
    assert!(second.cache_hit);
    assert_eq!(
        first.primary_route.as_ref().unwrap().total_distance_nm,
        second.primary_route.as_ref().unwrap().total_distance_nm
    );

    let stats = coordinator.stats();
    assert_eq!(stats.pathfinder_executions, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);

    // Both calls produced an analytics event.
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(!events[0].cache_hit);
    assert!(events[1].cache_hit);
}

/// Cache failures must degrade to a miss, never surface.
struct BrokenCache;

impl RouteCache for BrokenCache {
    fn get(&self, _key: &str) -> fairway_lib::Result<Option<Vec<u8>>> {
        Err(Error::BackendUnavailable {
            backend: "cache".into(),
            message: "down".into(),
        })
    }

    fn put(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> fairway_lib::Result<()> {
        Err(Error::BackendUnavailable {
            backend: "cache".into(),
            message: "down".into(),
        })
    }
}

#[tokio::test]
async fn broken_cache_degrades_to_recomputation() {
    let sink = Arc::new(CountingSink::new());
    let coordinator = coordinator_with(
        scenario_store(),
        Arc::new(BrokenCache),
        sink,
        scenario_config(),
    );

    let first = coordinator
        .calculate(route_request("SGSIN", "NLRTM"))
        .await
        .unwrap();
    let second = coordinator
        .calculate(route_request("SGSIN", "NLRTM"))
        .await
        .unwrap();
    assert!(first.primary_route.is_some());
    assert!(!second.cache_hit);
    assert_eq!(coordinator.stats().pathfinder_executions, 2);
}

#[tokio::test]
async fn exhausted_semaphore_reports_overloaded() {
    let sink = Arc::new(CountingSink::new());
    let config = PlannerConfig {
        max_concurrent_calculations: 0,
        overload_wait: Duration::from_millis(20),
        ..scenario_config()
    };
    let coordinator = coordinator_with(
        scenario_store(),
        Arc::new(MemoryCache::new()),
        sink,
        config,
    );

    let err = coordinator
        .calculate(route_request("SGSIN", "NLRTM"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Overloaded));

    // The in-flight entry was released; a retry fails the same way rather
    // than hanging on a stale registration.
    let err = coordinator
        .calculate(route_request("SGSIN", "NLRTM"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Overloaded));
}

#[tokio::test]
async fn exactly_k_simple_paths_are_returned_in_cost_order() {
    // A four-port diamond: direct leg plus one detour per via port. With at
    // most one connecting port there are exactly three simple paths.
    let origin = port_at("AAAAA", 0.0, 0.0);
    let destination = port_at("BBBBB", 0.0, 16.0);
    let near_via = port_at("CCCCC", 1.0, 8.0);
    let far_via = port_at("DDDDD", 3.0, 8.0);

    let config = PlannerConfig {
        graph_k_nearest: 8,
        graph_knn_radius_nm: 1500.0,
        graph_hub_count: 0,
        pathfinder_alt_cost_ratio: 3.0,
        ..PlannerConfig::default()
    };
    let store = store_for(
        catalog_from(vec![origin, destination, near_via, far_via]),
        config.clone(),
    );
    let coordinator = coordinator_with(
        store,
        Arc::new(MemoryCache::new()),
        Arc::new(CountingSink::new()),
        config,
    );

    let mut request = route_request("AAAAA", "BBBBB");
    request.max_alternative_routes = 2;
    request.max_connecting_ports = 1;
    let response = coordinator.calculate(request).await.unwrap();

    let primary = response.primary_route.as_ref().unwrap();
    assert!(primary.intermediate_ports.is_empty());
    assert_eq!(response.alternative_routes.len(), 2);
    assert_eq!(
        response.alternative_routes[0].intermediate_ports,
        vec!["CCCCC".to_string()]
    );
    assert_eq!(
        response.alternative_routes[1].intermediate_ports,
        vec!["DDDDD".to_string()]
    );
    assert!(
        primary.total_distance_nm < response.alternative_routes[0].total_distance_nm
            && response.alternative_routes[0].total_distance_nm
                < response.alternative_routes[1].total_distance_nm
    );
}
