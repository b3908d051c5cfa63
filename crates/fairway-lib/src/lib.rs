//! Fairway route planning core.
//!
//! This crate computes optimal maritime routes between ports: given an origin
//! and destination UN/LOCODE, vessel constraints, and an optimization
//! criterion, it returns a primary route plus ranked alternatives, each with
//! distance, duration, fuel, cost, and risk scores. Higher-level consumers
//! (the HTTP service) depend only on the types exported here.
//!
//! # Architecture
//!
//! The request flow is owned by the [`RouteCoordinator`]:
//!
//! 1. **Validate** the request and resolve both ports.
//! 2. **Fingerprint** it and consult the route cache.
//! 3. **Single-flight**: concurrent identical requests attach to one
//!    computation.
//! 4. **Compute** under the request deadline: pathfind over the current
//!    [`catalog::Snapshot`] (catalog + spatial index + port graph), then
//!    assemble detailed routes.
//! 5. **Store** the response and emit an analytics event.
//!
//! The graph is materialized once per catalog generation by
//! [`graph::build_port_graph`] and swapped atomically through the
//! [`catalog::SnapshotStore`]; the pathfinder runs Dijkstra or A* with
//! per-edge vessel feasibility and Yen's algorithm for alternatives.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fairway_lib::{
//!     CostModel, CostTables, InMemoryRepository, MemoryCache, PlannerConfig,
//!     PortCatalog, RouteCoordinator, Snapshot, SnapshotStore, TracingSink, ZoneMap,
//! };
//!
//! # async fn run(request: fairway_lib::RouteRequest) -> fairway_lib::Result<()> {
//! let config = PlannerConfig::from_env();
//! let zones = ZoneMap::default();
//! let catalog = PortCatalog::load(std::path::Path::new("ports.json"), 1)?;
//! let snapshot = Snapshot::build(catalog, &zones, &config)?;
//! let store = Arc::new(SnapshotStore::new(snapshot, zones, config.clone()));
//!
//! let coordinator = RouteCoordinator::new(
//!     store.clone(),
//!     Arc::new(InMemoryRepository::new(store)),
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(TracingSink),
//!     CostModel::new(CostTables::default()),
//!     config,
//! );
//! let response = coordinator.calculate(request).await?;
//! println!("{} candidate routes", response.routes_evaluated);
//! # Ok(())
//! # }
//! ```

#![deny(warnings)]

pub mod analytics;
pub mod assemble;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod cost;
pub mod error;
pub mod fingerprint;
pub mod geo;
pub mod graph;
pub mod path;
pub mod port;
pub mod repo;
pub mod request;
pub mod spatial;
pub mod test_helpers;
pub mod zones;

pub use analytics::{AnalyticsSink, CalculationEvent, CalculationOutcome, NullSink, TracingSink};
pub use assemble::{assemble_route, DetailedRoute, RouteSegment};
pub use cache::{route_key, MemoryCache, RouteCache};
pub use catalog::{PortCatalog, Snapshot, SnapshotStore};
pub use config::PlannerConfig;
pub use coordinator::{CoordinatorStats, RouteCoordinator, RouteResponse};
pub use cost::{CostBreakdown, CostModel, CostTables};
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, Fingerprint};
pub use geo::{distance_nm, initial_bearing, interpolate, Position, EARTH_RADIUS_NM};
pub use graph::{build_port_graph, Edge, EdgeKind, NodeId, PortGraph};
pub use path::{CancelToken, GraphPath, Pathfinder, PathfinderOutcome, SearchParams};
pub use port::{
    FuelType, OperationalStatus, OptimizationCriteria, Port, PortType, VesselConstraints,
    VesselType,
};
pub use repo::{InMemoryRepository, MatchKind, PortRepository, PortSearchHit, SearchOptions};
pub use request::{RouteRequest, ValidationResult};
pub use spatial::{ProximityQuery, SpatialIndex};
pub use zones::ZoneMap;
