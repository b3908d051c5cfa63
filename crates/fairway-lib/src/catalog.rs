//! Port catalog and copy-on-write snapshots.
//!
//! The catalog is owned by external ingestion; this module loads it from a
//! JSON data file, validates invariants, and manages the derived spatial
//! index and port graph as one immutable [`Snapshot`]. Catalog version bumps
//! build a fresh snapshot off to the side and swap it in atomically; readers
//! take a snapshot at request start and keep it for the whole request.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::graph::{build_port_graph, PortGraph};
use crate::port::Port;
use crate::spatial::SpatialIndex;
use crate::zones::ZoneMap;

/// The in-memory port catalog, keyed by UN/LOCODE.
#[derive(Debug, Clone, Default)]
pub struct PortCatalog {
    ports: BTreeMap<String, Port>,
    version: u64,
}

impl PortCatalog {
    /// Build a catalog from a list of ports, validating every record and the
    /// uniqueness of codes.
    pub fn new(ports: Vec<Port>, version: u64) -> Result<Self> {
        let mut map = BTreeMap::new();
        for port in ports {
            port.validate()?;
            if map.contains_key(&port.unlocode) {
                return Err(Error::validation(format!(
                    "duplicate UN/LOCODE in catalog: {}",
                    port.unlocode
                )));
            }
            map.insert(port.unlocode.clone(), port);
        }
        Ok(Self {
            ports: map,
            version,
        })
    }

    /// Load the catalog from a JSON data file (an array of port records).
    pub fn load(path: &Path, version: u64) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::DataFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let ports: Vec<Port> = serde_json::from_str(&raw).map_err(|e| Error::DataFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        info!(path = %path.display(), ports = ports.len(), "loaded port catalog");
        Self::new(ports, version)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, code: &str) -> Option<&Port> {
        self.ports.get(code)
    }

    /// Ports in UN/LOCODE order. The deterministic iteration order is load-
    /// bearing: graph adjacency and spatial slots derive from it.
    pub fn ports_sorted(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Resolve a code to a port that currently accepts traffic.
    pub fn get_operational(&self, code: &str) -> Result<&Port> {
        match self.ports.get(code) {
            Some(port) if port.status.accepts_traffic() => Ok(port),
            _ => Err(Error::PortNotFound {
                code: code.to_string(),
            }),
        }
    }
}

/// One immutable generation of catalog-derived state.
pub struct Snapshot {
    pub catalog: Arc<PortCatalog>,
    pub index: Arc<SpatialIndex>,
    pub graph: Arc<PortGraph>,
}

impl Snapshot {
    /// Build a snapshot from a catalog: bulk-load the index, then materialize
    /// the graph. Fails with `GraphBuildFailed` if the graph is disconnected.
    pub fn build(catalog: PortCatalog, zones: &ZoneMap, config: &PlannerConfig) -> Result<Self> {
        let catalog = Arc::new(catalog);
        let index = Arc::new(SpatialIndex::build(&catalog));
        let graph = Arc::new(build_port_graph(&catalog, &index, zones, config)?);
        Ok(Self {
            catalog,
            index,
            graph,
        })
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("catalog_version", &self.catalog.version())
            .field("ports", &self.catalog.len())
            .field("graph_edges", &self.graph.edge_count())
            .finish()
    }
}

/// Holder for the current snapshot with atomic swap semantics.
///
/// Readers clone an `Arc` under a read lock (O(1), no I/O); rebuilds are
/// serialized by a separate mutex so concurrent version bumps collapse into
/// one build. A failed rebuild leaves the previous good snapshot in place.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    rebuild: Mutex<()>,
    zones: ZoneMap,
    config: PlannerConfig,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot, zones: ZoneMap, config: PlannerConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            rebuild: Mutex::new(()),
            zones,
            config,
        }
    }

    /// The current snapshot. Callers hold the returned `Arc` for the full
    /// request so the generation cannot change underneath them.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().expect("snapshot lock poisoned").clone()
    }

    /// Rebuild from a new catalog generation and swap it in.
    ///
    /// Stale generations (version not newer than current) are ignored, which
    /// also makes concurrent rebuild attempts idempotent: whoever holds the
    /// rebuild lock first wins, later callers see the bumped version and
    /// return without building.
    pub fn refresh(&self, catalog: PortCatalog) -> Result<()> {
        let _guard = self.rebuild.lock().expect("rebuild lock poisoned");
        if catalog.version() <= self.snapshot().catalog.version() {
            return Ok(());
        }
        let version = catalog.version();
        match Snapshot::build(catalog, &self.zones, &self.config) {
            Ok(snapshot) => {
                *self.current.write().expect("snapshot lock poisoned") = Arc::new(snapshot);
                info!(version, "swapped in new catalog snapshot");
                Ok(())
            }
            Err(err) => {
                // Previous good snapshot remains in use.
                warn!(version, error = %err, "catalog refresh failed, keeping previous snapshot");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{port_at, scenario_catalog, scenario_config};

    #[test]
    fn duplicate_codes_are_rejected() {
        let result = PortCatalog::new(vec![port_at("AAAAA", 0.0, 0.0), port_at("AAAAA", 1.0, 1.0)], 1);
        assert!(result.is_err());
    }

    #[test]
    fn operational_lookup_refuses_inactive() {
        let mut closed = port_at("BBBBB", 0.0, 1.0);
        closed.status = crate::port::OperationalStatus::Maintenance;
        let catalog = PortCatalog::new(vec![port_at("AAAAA", 0.0, 0.0), closed], 1).unwrap();
        assert!(catalog.get_operational("AAAAA").is_ok());
        assert!(matches!(
            catalog.get_operational("BBBBB"),
            Err(Error::PortNotFound { .. })
        ));
        assert!(catalog.get_operational("ZZZZZ").is_err());
    }

    #[test]
    fn refresh_ignores_stale_versions() {
        let (catalog, config) = (scenario_catalog(), scenario_config());
        let zones = ZoneMap::default();
        let snapshot = Snapshot::build(catalog, &zones, &config).unwrap();
        let store = SnapshotStore::new(snapshot, zones, config);
        let v1 = store.snapshot().catalog.version();

        // Same version again: no swap.
        store.refresh(scenario_catalog()).unwrap();
        assert_eq!(store.snapshot().catalog.version(), v1);
    }

    #[test]
    fn refresh_swaps_newer_versions() {
        let (catalog, config) = (scenario_catalog(), scenario_config());
        let zones = ZoneMap::default();
        let snapshot = Snapshot::build(catalog, &zones, &config).unwrap();
        let store = SnapshotStore::new(snapshot, zones, config);

        let mut newer = scenario_catalog();
        newer = PortCatalog::new(newer.ports_sorted().cloned().collect(), 99).unwrap();
        store.refresh(newer).unwrap();
        assert_eq!(store.snapshot().catalog.version(), 99);
    }
}
