//! Shared fixtures for unit, integration, and downstream handler tests.
//!
//! The scenario catalog is a small set of real ports chosen so the built
//! graph exercises the interesting corridors: the Suez chain from Southeast
//! Asia to Northern Europe, the Cape of Good Hope alternative, and a direct
//! trans-Pacific leg.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::catalog::{PortCatalog, Snapshot, SnapshotStore};
use crate::config::PlannerConfig;
use crate::geo::Position;
use crate::path::SearchParams;
use crate::port::{
    FuelType, OperationalStatus, OptimizationCriteria, Port, PortType, VesselConstraints,
    VesselType,
};
use crate::request::RouteRequest;
use crate::zones::ZoneMap;

/// A minimal open multipurpose port at the given coordinates.
pub fn port_at(code: &str, lat: f64, lon: f64) -> Port {
    Port {
        unlocode: code.to_string(),
        name: code.to_string(),
        country: "XX".to_string(),
        position: Position::new(lat, lon),
        port_type: PortType::Multipurpose,
        status: OperationalStatus::Active,
        max_vessel_length_m: None,
        max_vessel_beam_m: None,
        max_draft_m: None,
        berths: 10,
        congestion_factor: 1.0,
        average_port_stay_hours: 24.0,
        services: Vec::new(),
    }
}

/// Build a version-1 catalog from a list of ports.
pub fn catalog_from(ports: Vec<Port>) -> PortCatalog {
    PortCatalog::new(ports, 1).expect("fixture catalog is valid")
}

#[allow(clippy::too_many_arguments)]
fn fixture_port(
    code: &str,
    name: &str,
    country: &str,
    lat: f64,
    lon: f64,
    port_type: PortType,
    berths: u32,
    max_draft_m: f64,
    congestion: f64,
) -> Port {
    Port {
        unlocode: code.to_string(),
        name: name.to_string(),
        country: country.to_string(),
        position: Position::new(lat, lon),
        port_type,
        status: OperationalStatus::Active,
        max_vessel_length_m: Some(420.0),
        max_vessel_beam_m: Some(70.0),
        max_draft_m: Some(max_draft_m),
        berths,
        congestion_factor: congestion,
        average_port_stay_hours: 20.0,
        services: vec!["bunkering".to_string(), "pilotage".to_string()],
    }
}

/// Fixture catalog covering the Suez and Cape corridors.
///
/// Berth counts are chosen so the hub set under [`scenario_config`] is
/// exactly Singapore, Jebel Ali, Port Said, Cape Town, Colombo, and Tema.
pub fn scenario_catalog() -> PortCatalog {
    use PortType::*;
    catalog_from(vec![
        fixture_port("SGSIN", "Singapore", "SG", 1.2644, 103.84, ContainerTerminal, 60, 16.0, 1.2),
        fixture_port("LKCMB", "Colombo", "LK", 6.9535, 79.8438, ContainerTerminal, 38, 18.0, 1.1),
        fixture_port("DJJIB", "Djibouti", "DJ", 11.6, 43.15, Multipurpose, 12, 23.0, 1.0),
        fixture_port("OMSLL", "Salalah", "OM", 16.95, 54.0, ContainerTerminal, 22, 23.0, 1.0),
        fixture_port("AEJEA", "Jebel Ali", "AE", 25.0118, 55.0618, ContainerTerminal, 50, 24.0, 1.1),
        fixture_port("EGSUZ", "Suez", "EG", 29.9668, 32.5498, Multipurpose, 10, 24.0, 1.0),
        fixture_port("EGPSD", "Port Said", "EG", 31.2653, 32.3019, ContainerTerminal, 44, 24.0, 1.1),
        fixture_port("MTMAR", "Marsaxlokk", "MT", 35.8986, 14.5047, ContainerTerminal, 31, 23.0, 1.0),
        fixture_port("ESALG", "Algeciras", "ES", 36.13, -5.43, ContainerTerminal, 26, 23.0, 1.0),
        fixture_port("NLRTM", "Rotterdam", "NL", 51.9496, 4.1453, ContainerTerminal, 30, 23.0, 1.1),
        fixture_port("BEANR", "Antwerp", "BE", 51.2333, 4.4167, ContainerTerminal, 28, 23.0, 1.1),
        fixture_port("MUPLU", "Port Louis", "MU", -20.16, 57.5, Multipurpose, 20, 23.0, 1.0),
        fixture_port("ZACPT", "Cape Town", "ZA", -33.9081, 18.4326, ContainerTerminal, 40, 23.0, 1.0),
        fixture_port("GHTEM", "Tema", "GH", 5.62, 0.007, Multipurpose, 32, 23.0, 1.2),
    ])
}

/// Fixture catalog for the trans-Pacific corridor.
pub fn pacific_catalog() -> PortCatalog {
    use PortType::*;
    catalog_from(vec![
        fixture_port("CNSHA", "Shanghai", "CN", 31.2304, 121.49, ContainerTerminal, 58, 17.0, 1.2),
        fixture_port("JPYOK", "Yokohama", "JP", 35.45, 139.65, ContainerTerminal, 36, 17.0, 1.0),
        fixture_port("USLAX", "Los Angeles", "US", 33.73, -118.26, ContainerTerminal, 52, 17.0, 1.25),
    ])
}

/// Graph configuration matched to the scenario catalog: a sparse corridor
/// graph rather than the near-complete mesh the defaults would produce over
/// fourteen ports.
pub fn scenario_config() -> PlannerConfig {
    PlannerConfig {
        graph_k_nearest: 8,
        graph_knn_radius_nm: 1300.0,
        graph_hub_count: 6,
        graph_hub_radius_nm: 3200.0,
        ..PlannerConfig::default()
    }
}

/// Configuration for the Pacific catalog: hub edges long enough for the
/// direct Shanghai - Los Angeles leg.
pub fn pacific_config() -> PlannerConfig {
    PlannerConfig {
        graph_hub_count: 3,
        graph_hub_radius_nm: 6000.0,
        ..PlannerConfig::default()
    }
}

/// Snapshot store over the scenario catalog.
pub fn scenario_store() -> Arc<SnapshotStore> {
    store_for(scenario_catalog(), scenario_config())
}

/// Snapshot store over the Pacific catalog.
pub fn pacific_store() -> Arc<SnapshotStore> {
    store_for(pacific_catalog(), pacific_config())
}

/// Build a snapshot store for any catalog/config pair.
pub fn store_for(catalog: PortCatalog, config: PlannerConfig) -> Arc<SnapshotStore> {
    let zones = ZoneMap::default();
    let snapshot =
        Snapshot::build(catalog, &zones, &config).expect("fixture graph builds and connects");
    Arc::new(SnapshotStore::new(snapshot, zones, config))
}

/// A 300 m container vessel cruising at 18 knots.
pub fn container_vessel() -> VesselConstraints {
    VesselConstraints {
        vessel_type: VesselType::Container,
        length_m: 300.0,
        beam_m: 45.0,
        draft_m: 14.0,
        deadweight_tonnage: Some(80_000.0),
        gross_tonnage: Some(95_000.0),
        cruise_speed_knots: 18.0,
        max_speed_knots: 24.0,
        max_range_nm: 14_000.0,
        fuel_type: FuelType::Vlsfo,
        suez_canal_compatible: true,
        panama_canal_compatible: true,
    }
}

/// A Suezmax-class tanker.
pub fn tanker_vessel() -> VesselConstraints {
    VesselConstraints {
        vessel_type: VesselType::Tanker,
        length_m: 330.0,
        beam_m: 60.0,
        draft_m: 22.0,
        deadweight_tonnage: Some(160_000.0),
        gross_tonnage: None,
        cruise_speed_knots: 14.0,
        max_speed_knots: 16.0,
        max_range_nm: 16_000.0,
        fuel_type: FuelType::Hfo,
        suez_canal_compatible: true,
        panama_canal_compatible: false,
    }
}

/// A balanced-criterion request with a fixed departure time so fingerprints
/// are stable across test runs.
pub fn route_request(origin: &str, destination: &str) -> RouteRequest {
    RouteRequest {
        origin: origin.to_string(),
        destination: destination.to_string(),
        vessel: container_vessel(),
        criterion: OptimizationCriteria::Balanced,
        departure_time: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        max_alternative_routes: 3,
        max_connecting_ports: 6,
        timeout_s: None,
    }
}

/// Search parameters for direct pathfinder tests.
pub fn search_params(max_paths: usize, max_intermediates: usize) -> SearchParams {
    SearchParams {
        criterion: OptimizationCriteria::Balanced,
        max_intermediates,
        max_paths,
        alt_cost_ratio: 1.5,
        cancel_check_interval: 4096,
    }
}
