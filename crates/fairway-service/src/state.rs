//! Shared application state for the axum handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use fairway_lib::{
    CostModel, CostTables, InMemoryRepository, MemoryCache, PlannerConfig, PortCatalog,
    PortRepository, RouteCache, RouteCoordinator, Snapshot, SnapshotStore, TracingSink, ZoneMap,
};

/// Cheaply cloneable handle to the long-lived service components.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    coordinator: RouteCoordinator,
    repository: Arc<dyn PortRepository>,
    cache: Arc<dyn RouteCache>,
    snapshots: Arc<SnapshotStore>,
    started_at: Instant,
}

impl AppState {
    /// Load everything from a catalog data file. A disconnected graph is
    /// fatal here, at startup.
    pub fn load(data_path: impl AsRef<Path>, config: PlannerConfig) -> fairway_lib::Result<Self> {
        let data_path = data_path.as_ref();
        info!(path = %data_path.display(), "loading port catalog");
        let catalog = PortCatalog::load(data_path, 1)?;
        Self::from_catalog(catalog, config)
    }

    /// Assemble the state from an already-built catalog; used by tests.
    pub fn from_catalog(
        catalog: PortCatalog,
        config: PlannerConfig,
    ) -> fairway_lib::Result<Self> {
        let zones = ZoneMap::default();
        let snapshot = Snapshot::build(catalog, &zones, &config)?;
        info!(
            ports = snapshot.catalog.len(),
            edges = snapshot.graph.edge_count(),
            "port graph materialized"
        );
        let snapshots = Arc::new(SnapshotStore::new(snapshot, zones, config.clone()));
        let repository: Arc<dyn PortRepository> =
            Arc::new(InMemoryRepository::new(snapshots.clone()));
        let cache: Arc<dyn RouteCache> = Arc::new(MemoryCache::new());

        let coordinator = RouteCoordinator::new(
            snapshots.clone(),
            repository.clone(),
            cache.clone(),
            Arc::new(TracingSink),
            CostModel::new(CostTables::default()),
            config,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                coordinator,
                repository,
                cache,
                snapshots,
                started_at: Instant::now(),
            }),
        })
    }

    pub fn coordinator(&self) -> &RouteCoordinator {
        &self.inner.coordinator
    }

    pub fn repository(&self) -> &Arc<dyn PortRepository> {
        &self.inner.repository
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.inner.snapshots
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }

    /// Probe the cache backend with a throwaway read.
    pub fn cache_reachable(&self) -> bool {
        self.inner.cache.get("health:probe").is_ok()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.snapshots.snapshot();
        f.debug_struct("AppState")
            .field("ports", &snapshot.catalog.len())
            .field("catalog_version", &snapshot.catalog.version())
            .finish()
    }
}
