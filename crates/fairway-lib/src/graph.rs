//! Port graph materialization.
//!
//! The routing graph is a sparse directed graph over the active port catalog:
//! k-nearest-neighbour legs within a radius cap, curated canal edges, and hub
//! edges from the top-N ports by berth count. Every edge has a reverse twin
//! with identical geometric distance; adjacency lists are kept in UN/LOCODE
//! order so searches iterate deterministically.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::catalog::PortCatalog;
use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::geo::{distance_nm, midpoint};
use crate::port::Port;
use crate::spatial::{ProximityQuery, SpatialIndex};
use crate::zones::ZoneMap;

/// Node index into the graph's port table.
pub type NodeId = u32;

/// Classification of a routing leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    OpenSea,
    Coastal,
    CanalSuez,
    CanalPanama,
    River,
}

impl EdgeKind {
    /// Whether this leg requires a canal compatibility flag on the vessel.
    pub fn is_canal(&self) -> bool {
        matches!(self, EdgeKind::CanalSuez | EdgeKind::CanalPanama)
    }
}

/// A directed leg between two ports.
#[derive(Debug, Clone)]
pub struct Edge {
    pub target: NodeId,
    pub kind: EdgeKind,
    /// Great-circle distance in nautical miles, > 0.
    pub distance_nm: f64,
    /// Base traffic congestion multiplier for the leg, >= 1.0.
    pub congestion: f64,
    /// Weather-zone transit factor, >= 1.0.
    pub weather_factor: f64,
    /// Piracy risk score, [0, 100].
    pub piracy_risk: f64,
    /// Political risk score, [0, 100].
    pub political_risk: f64,
    /// Transit speed cap in knots (canals and restricted waters).
    pub speed_cap_knots: Option<f64>,
}

/// Curated canal links: gateway port pair, edge kind, transit speed cap.
const CANAL_LINKS: &[(&str, &str, EdgeKind, f64)] = &[
    ("EGSUZ", "EGPSD", EdgeKind::CanalSuez, 8.0),
    ("PABLB", "PAONX", EdgeKind::CanalPanama, 8.0),
    ("DEBRB", "DEKEL", EdgeKind::Coastal, 8.0),
    ("TRIST", "TRZON", EdgeKind::Coastal, 10.0),
];

/// The materialized routing graph for one catalog generation.
pub struct PortGraph {
    codes: Vec<String>,
    node_ids: HashMap<String, NodeId>,
    adjacency: Vec<Vec<Edge>>,
    catalog_version: u64,
}

impl PortGraph {
    pub fn node_count(&self) -> usize {
        self.codes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    pub fn node_id(&self, code: &str) -> Option<NodeId> {
        self.node_ids.get(code).copied()
    }

    pub fn code(&self, node: NodeId) -> &str {
        &self.codes[node as usize]
    }

    /// Outgoing edges in UN/LOCODE order of target.
    pub fn neighbours(&self, node: NodeId) -> &[Edge] {
        &self.adjacency[node as usize]
    }

    /// The edge from `from` to `to`, if present.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.adjacency[from as usize]
            .iter()
            .find(|e| e.target == to)
    }
}

impl std::fmt::Debug for PortGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("catalog_version", &self.catalog_version)
            .finish()
    }
}

/// Materialize the routing graph from the active catalog.
///
/// Construction order follows the design: bulk spatial index (done by the
/// caller), k-NN legs, curated canal edges, hub edges, connectivity check.
/// Candidate legs crossing a landmass barrier are discarded; a curated canal
/// pair is only ever connected by its canal edge.
pub fn build_port_graph(
    catalog: &PortCatalog,
    index: &SpatialIndex,
    zones: &ZoneMap,
    config: &PlannerConfig,
) -> Result<PortGraph> {
    // Node set: ports that currently accept traffic, in code order.
    let nodes: Vec<&Port> = catalog
        .ports_sorted()
        .filter(|p| p.status.accepts_traffic())
        .collect();
    if nodes.len() < 2 {
        return Err(Error::GraphBuildFailed {
            reason: format!("catalog has {} active ports, need at least 2", nodes.len()),
        });
    }

    let codes: Vec<String> = nodes.iter().map(|p| p.unlocode.clone()).collect();
    let node_ids: HashMap<String, NodeId> = codes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i as NodeId))
        .collect();

    let canal_pairs: Vec<(NodeId, NodeId, EdgeKind, f64)> = CANAL_LINKS
        .iter()
        .filter_map(|(a, b, kind, cap)| {
            Some((*node_ids.get(*a)?, *node_ids.get(*b)?, *kind, *cap))
        })
        .collect();
    let is_canal_pair = |u: NodeId, v: NodeId| {
        canal_pairs
            .iter()
            .any(|&(a, b, _, _)| (a, b) == (u, v) || (b, a) == (u, v))
    };

    // Undirected candidate pair set; (small, large) keying deduplicates the
    // twin directions.
    let mut pairs: HashMap<(NodeId, NodeId), f64> = HashMap::new();
    let mut barrier_skips = 0usize;

    // k-NN legs.
    let query = ProximityQuery {
        k: config.graph_k_nearest + 1, // the query point matches itself
        radius_nm: Some(config.graph_knn_radius_nm),
        active_only: true,
    };
    for (u, port) in nodes.iter().enumerate() {
        let u = u as NodeId;
        let mut taken = 0usize;
        for (code, dist) in index.nearest(port.position, &query, catalog) {
            if code == port.unlocode {
                continue;
            }
            if taken >= config.graph_k_nearest {
                break;
            }
            taken += 1;
            let Some(&v) = node_ids.get(code) else {
                continue;
            };
            if is_canal_pair(u, v) {
                continue;
            }
            if zones
                .crossed_barrier(port.position, nodes[v as usize].position)
                .is_some()
            {
                barrier_skips += 1;
                continue;
            }
            pairs.entry(ordered(u, v)).or_insert(dist);
        }
    }

    // Hub legs: top-N by berth count among hub-candidate types, deterministic
    // tie-break on code.
    let mut hub_candidates: Vec<&&Port> = nodes
        .iter()
        .filter(|p| p.port_type.is_hub_candidate())
        .collect();
    hub_candidates.sort_by(|a, b| {
        b.berths
            .cmp(&a.berths)
            .then_with(|| a.unlocode.cmp(&b.unlocode))
    });
    let hubs: Vec<NodeId> = hub_candidates
        .iter()
        .take(config.graph_hub_count)
        .map(|p| node_ids[&p.unlocode])
        .collect();

    for &h in &hubs {
        let hub_pos = nodes[h as usize].position;
        for (v, other) in nodes.iter().enumerate() {
            let v = v as NodeId;
            if v == h || is_canal_pair(h, v) {
                continue;
            }
            let dist = distance_nm(hub_pos, other.position);
            if dist > config.graph_hub_radius_nm {
                continue;
            }
            if zones.crossed_barrier(hub_pos, other.position).is_some() {
                barrier_skips += 1;
                continue;
            }
            pairs.entry(ordered(h, v)).or_insert(dist);
        }
    }

    // Materialize both directions with metrics from the zone map.
    let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); nodes.len()];
    for (&(u, v), &dist) in &pairs {
        let kind = classify_leg(dist);
        push_twin_edges(&mut adjacency, nodes.as_slice(), zones, u, v, dist, kind, None);
    }
    for &(u, v, kind, cap) in &canal_pairs {
        let dist = distance_nm(nodes[u as usize].position, nodes[v as usize].position);
        push_twin_edges(&mut adjacency, nodes.as_slice(), zones, u, v, dist, kind, Some(cap));
    }

    for list in &mut adjacency {
        list.sort_by(|a, b| codes[a.target as usize].cmp(&codes[b.target as usize]));
    }

    let graph = PortGraph {
        codes,
        node_ids,
        adjacency,
        catalog_version: catalog.version(),
    };

    // Connectivity over all active nodes, enforced by the hub backbone.
    let reachable = reachable_count(&graph, 0);
    if reachable != graph.node_count() {
        return Err(Error::GraphBuildFailed {
            reason: format!(
                "graph disconnected: {reachable} of {} active ports reachable",
                graph.node_count()
            ),
        });
    }

    debug!(barrier_skips, hubs = hubs.len(), "graph candidate filtering");
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        version = catalog.version(),
        "built port graph"
    );
    Ok(graph)
}

fn ordered(u: NodeId, v: NodeId) -> (NodeId, NodeId) {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}

/// Short legs hug the coast, long ones are open water.
fn classify_leg(distance_nm: f64) -> EdgeKind {
    if distance_nm < 250.0 {
        EdgeKind::Coastal
    } else {
        EdgeKind::OpenSea
    }
}

#[allow(clippy::too_many_arguments)]
fn push_twin_edges(
    adjacency: &mut [Vec<Edge>],
    nodes: &[&Port],
    zones: &ZoneMap,
    u: NodeId,
    v: NodeId,
    dist: f64,
    kind: EdgeKind,
    speed_cap: Option<f64>,
) {
    let mid = midpoint(nodes[u as usize].position, nodes[v as usize].position);
    let weather = zones.weather_factor(mid);
    let piracy = zones.piracy_score(mid);
    let political =
        zones.political_score(&nodes[u as usize].country, &nodes[v as usize].country);
    let congestion = if kind.is_canal() { 1.1 } else { 1.0 };

    for (from, to) in [(u, v), (v, u)] {
        adjacency[from as usize].push(Edge {
            target: to,
            kind,
            distance_nm: dist,
            congestion,
            weather_factor: weather,
            piracy_risk: piracy,
            political_risk: political,
            speed_cap_knots: speed_cap,
        });
    }
}

fn reachable_count(graph: &PortGraph, start: NodeId) -> usize {
    let mut seen = vec![false; graph.node_count()];
    let mut stack = vec![start];
    seen[start as usize] = true;
    let mut count = 0;
    while let Some(node) = stack.pop() {
        count += 1;
        for edge in graph.neighbours(node) {
            if !seen[edge.target as usize] {
                seen[edge.target as usize] = true;
                stack.push(edge.target);
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scenario_catalog, scenario_config};

    fn build_fixture() -> PortGraph {
        let catalog = scenario_catalog();
        let index = SpatialIndex::build(&catalog);
        build_port_graph(&catalog, &index, &ZoneMap::default(), &scenario_config()).unwrap()
    }

    #[test]
    fn every_edge_has_a_reverse_twin_with_same_distance() {
        let graph = build_fixture();
        for u in 0..graph.node_count() as NodeId {
            for edge in graph.neighbours(u) {
                let twin = graph
                    .edge_between(edge.target, u)
                    .expect("reverse twin missing");
                assert_eq!(twin.distance_nm, edge.distance_nm);
            }
        }
    }

    #[test]
    fn graph_is_loop_free() {
        let graph = build_fixture();
        for u in 0..graph.node_count() as NodeId {
            assert!(graph.neighbours(u).iter().all(|e| e.target != u));
        }
    }

    #[test]
    fn adjacency_is_in_code_order() {
        let graph = build_fixture();
        for u in 0..graph.node_count() as NodeId {
            let codes: Vec<&str> = graph
                .neighbours(u)
                .iter()
                .map(|e| graph.code(e.target))
                .collect();
            let mut sorted = codes.clone();
            sorted.sort();
            assert_eq!(codes, sorted);
        }
    }

    #[test]
    fn canal_pair_is_connected_only_by_the_canal_edge() {
        let graph = build_fixture();
        let suz = graph.node_id("EGSUZ").unwrap();
        let psd = graph.node_id("EGPSD").unwrap();
        let edge = graph.edge_between(suz, psd).expect("canal edge");
        assert_eq!(edge.kind, EdgeKind::CanalSuez);
        assert_eq!(edge.speed_cap_knots, Some(8.0));
        // Exactly one edge between the pair.
        let count = graph
            .neighbours(suz)
            .iter()
            .filter(|e| e.target == psd)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn no_leg_crosses_a_landmass_barrier() {
        let graph = build_fixture();
        let catalog = scenario_catalog();
        let zones = ZoneMap::default();
        for u in 0..graph.node_count() as NodeId {
            let from = catalog.get(graph.code(u)).unwrap().position;
            for edge in graph.neighbours(u) {
                if edge.kind.is_canal() {
                    continue;
                }
                let to = catalog.get(graph.code(edge.target)).unwrap().position;
                assert!(
                    zones.crossed_barrier(from, to).is_none(),
                    "{} -> {} crosses {:?}",
                    graph.code(u),
                    graph.code(edge.target),
                    zones.crossed_barrier(from, to)
                );
            }
        }
    }

    #[test]
    fn disconnected_catalog_fails_the_build() {
        use crate::catalog::PortCatalog;
        use crate::test_helpers::port_at;

        // Two ports on opposite sides of the planet, far outside every radius.
        let catalog = PortCatalog::new(
            vec![port_at("AAAAA", 0.0, 0.0), port_at("BBBBB", 0.0, 179.0)],
            1,
        )
        .unwrap();
        let index = SpatialIndex::build(&catalog);
        let err = build_port_graph(
            &catalog,
            &index,
            &ZoneMap::default(),
            &scenario_config(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::GraphBuildFailed { .. }));
    }
}
