//! Pathfinding over the port graph.
//!
//! Dijkstra with a binary min-heap and early termination, switching to A*
//! with an admissible great-circle lower bound when the criterion provides
//! one. Vessel feasibility is enforced per edge on the fly; infeasible edges
//! are never pushed. Alternatives come from Yen's algorithm over the same
//! filtered graph. Output ordering is deterministic: ties break on fewer
//! hops, then on the lexicographically smaller UN/LOCODE sequence, and
//! adjacency lists are iterated in UN/LOCODE order.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::PortCatalog;
use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::geo::distance_nm;
use crate::graph::{Edge, EdgeKind, NodeId, PortGraph};
use crate::port::{OptimizationCriteria, Port, VesselConstraints};

/// Cooperative cancellation handle carrying the request deadline.
///
/// The search polls this every `cancel_check_interval` node expansions; the
/// pathfinder itself never suspends.
#[derive(Debug, Clone)]
pub struct CancelToken {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Relaxed);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Error if cancelled or past the deadline, otherwise `Ok`.
    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(AtomicOrdering::Relaxed) {
            return Err(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

/// Search tuning passed in from the coordinator.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub criterion: OptimizationCriteria,
    /// Maximum number of intermediate (connecting) ports on a path.
    pub max_intermediates: usize,
    /// Total number of paths wanted: one primary plus the alternatives.
    pub max_paths: usize,
    /// Alternatives costing more than this multiple of the primary are cut.
    pub alt_cost_ratio: f64,
    /// Node expansions between cancellation checks.
    pub cancel_check_interval: usize,
}

/// One computed path with its scalar cost.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub nodes: Vec<NodeId>,
    pub cost: f64,
}

impl GraphPath {
    pub fn intermediates(&self) -> usize {
        self.nodes.len().saturating_sub(2)
    }
}

/// Result of a top-k search.
#[derive(Debug)]
pub struct PathfinderOutcome {
    /// Primary first, alternatives in ascending cost order. Empty when the
    /// feasible subgraph disconnects origin from destination.
    pub paths: Vec<GraphPath>,
    /// Candidate paths examined across the whole computation.
    pub candidates_evaluated: usize,
    /// Algorithm tag for the response metadata.
    pub algorithm: &'static str,
}

/// Vessel feasibility check for a single edge: both endpoints must
/// accommodate the vessel's dimensions and accept traffic, canal edges
/// require the matching compatibility flag, and a leg longer than the
/// vessel's fuel range cannot be sailed without a port call.
pub fn edge_feasible(tail: &Port, head: &Port, edge: &Edge, vessel: &VesselConstraints) -> bool {
    if edge.distance_nm > vessel.max_range_nm {
        return false;
    }
    for port in [tail, head] {
        if !port.status.accepts_traffic() {
            return false;
        }
        if !port.accommodates(vessel.length_m, vessel.beam_m, vessel.draft_m) {
            return false;
        }
    }
    match edge.kind {
        EdgeKind::CanalSuez => vessel.suez_canal_compatible,
        EdgeKind::CanalPanama => vessel.panama_canal_compatible,
        _ => true,
    }
}

/// The pathfinder over one immutable graph snapshot.
pub struct Pathfinder<'a> {
    graph: &'a PortGraph,
    catalog: &'a PortCatalog,
    cost_model: &'a CostModel,
    vessel: &'a VesselConstraints,
    params: SearchParams,
    cancel: &'a CancelToken,
    expansions: Cell<usize>,
}

impl<'a> Pathfinder<'a> {
    pub fn new(
        graph: &'a PortGraph,
        catalog: &'a PortCatalog,
        cost_model: &'a CostModel,
        vessel: &'a VesselConstraints,
        params: SearchParams,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            graph,
            catalog,
            cost_model,
            vessel,
            params,
            cancel,
            expansions: Cell::new(0),
        }
    }

    /// Compute the primary path and up to `max_paths - 1` alternatives.
    pub fn find_routes(&self, origin: NodeId, destination: NodeId) -> Result<PathfinderOutcome> {
        let algorithm = match self
            .cost_model
            .min_cost_per_nm(self.vessel, self.params.criterion)
        {
            Some(_) => "a_star",
            None => "dijkstra",
        };

        let no_avoid = (HashSet::new(), HashSet::new());
        let mut evaluated = 1usize;
        let Some(primary) = self.shortest(origin, destination, &no_avoid.0, &no_avoid.1)? else {
            return Ok(PathfinderOutcome {
                paths: Vec::new(),
                candidates_evaluated: evaluated,
                algorithm,
            });
        };

        let mut accepted: Vec<GraphPath> = vec![primary];
        let mut candidates: Vec<GraphPath> = Vec::new();

        // Yen's algorithm: deviate from each prefix of the latest accepted
        // path, collecting loopless candidates.
        while accepted.len() < self.params.max_paths {
            let base = accepted.last().expect("accepted is never empty").clone();
            for spur_index in 0..base.nodes.len() - 1 {
                let root = &base.nodes[..=spur_index];
                let spur_node = base.nodes[spur_index];

                let mut avoid_edges: HashSet<(NodeId, NodeId)> = HashSet::new();
                for path in accepted.iter().chain(candidates.iter()) {
                    if path.nodes.len() > spur_index + 1 && path.nodes[..=spur_index] == *root {
                        avoid_edges.insert((path.nodes[spur_index], path.nodes[spur_index + 1]));
                    }
                }
                let avoid_nodes: HashSet<NodeId> = root[..spur_index].iter().copied().collect();

                evaluated += 1;
                let Some(spur) = self.shortest(spur_node, destination, &avoid_nodes, &avoid_edges)?
                else {
                    continue;
                };

                let mut nodes = root[..spur_index].to_vec();
                nodes.extend(spur.nodes);
                if nodes.len().saturating_sub(2) > self.params.max_intermediates {
                    continue;
                }
                let Some(cost) = self.path_cost(&nodes) else {
                    continue;
                };
                let candidate = GraphPath { nodes, cost };
                if accepted.iter().any(|p| p.nodes == candidate.nodes)
                    || candidates.iter().any(|p| p.nodes == candidate.nodes)
                {
                    continue;
                }
                candidates.push(candidate);
            }

            candidates.sort_by(|a, b| compare_paths(a, b, self.graph));
            let Some(best) = candidates.first().cloned() else {
                break;
            };
            candidates.remove(0);
            if best.cost > self.params.alt_cost_ratio * accepted[0].cost {
                break;
            }
            accepted.push(best);
        }

        Ok(PathfinderOutcome {
            paths: accepted,
            candidates_evaluated: evaluated,
            algorithm,
        })
    }

    /// Scalar cost of a node sequence, `None` if an edge is missing or
    /// infeasible.
    fn path_cost(&self, nodes: &[NodeId]) -> Option<f64> {
        let mut total = 0.0;
        for pair in nodes.windows(2) {
            let edge = self.graph.edge_between(pair[0], pair[1])?;
            let tail = self.catalog.get(self.graph.code(pair[0]))?;
            let head = self.catalog.get(self.graph.code(pair[1]))?;
            if !edge_feasible(tail, head, edge, self.vessel) {
                return None;
            }
            total += self
                .cost_model
                .edge_cost(edge, head, self.vessel, self.params.criterion)
                .scalar;
        }
        Some(total)
    }

    /// Hop-capped shortest path under the criterion.
    ///
    /// State space is `(node, intermediates used)` so a path that spends its
    /// hop budget differently is explored independently. Returns `Ok(None)`
    /// when the feasible subgraph disconnects the pair.
    fn shortest(
        &self,
        origin: NodeId,
        destination: NodeId,
        avoid_nodes: &HashSet<NodeId>,
        avoid_edges: &HashSet<(NodeId, NodeId)>,
    ) -> Result<Option<GraphPath>> {
        if avoid_nodes.contains(&origin) {
            return Ok(None);
        }
        let heuristic = self
            .cost_model
            .min_cost_per_nm(self.vessel, self.params.criterion);
        let goal_pos = self
            .catalog
            .get(self.graph.code(destination))
            .map(|p| p.position);

        let estimate = |node: NodeId| -> f64 {
            match (heuristic, goal_pos) {
                (Some(per_nm), Some(goal)) => {
                    let here = self
                        .catalog
                        .get(self.graph.code(node))
                        .map(|p| p.position);
                    here.map_or(0.0, |pos| per_nm * distance_nm(pos, goal))
                }
                _ => 0.0,
            }
        };

        // dist keyed by (node, intermediates used so far).
        let mut best: HashMap<(NodeId, usize), (f64, u32)> = HashMap::new();
        let mut parents: HashMap<(NodeId, usize), (NodeId, usize)> = HashMap::new();
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();

        best.insert((origin, 0), (0.0, 0));
        heap.push(HeapEntry {
            priority: estimate(origin),
            cost: 0.0,
            hops: 0,
            node: origin,
            intermediates: 0,
        });

        while let Some(entry) = heap.pop() {
            self.count_expansion()?;

            if entry.node == destination {
                return Ok(Some(GraphPath {
                    nodes: reconstruct(&parents, origin, (entry.node, entry.intermediates)),
                    cost: entry.cost,
                }));
            }

            let state = (entry.node, entry.intermediates);
            match best.get(&state) {
                Some(&(cost, hops)) if (cost, hops) < (entry.cost, entry.hops) => continue,
                _ => {}
            }

            let Some(tail) = self.catalog.get(self.graph.code(entry.node)) else {
                continue;
            };

            for edge in self.graph.neighbours(entry.node) {
                if avoid_nodes.contains(&edge.target)
                    || avoid_edges.contains(&(entry.node, edge.target))
                {
                    continue;
                }
                let Some(head) = self.catalog.get(self.graph.code(edge.target)) else {
                    continue;
                };
                if !edge_feasible(tail, head, edge, self.vessel) {
                    continue;
                }

                let next_intermediates = if edge.target == destination {
                    entry.intermediates
                } else {
                    entry.intermediates + 1
                };
                if next_intermediates > self.params.max_intermediates {
                    continue;
                }

                let step = self
                    .cost_model
                    .edge_cost(edge, head, self.vessel, self.params.criterion)
                    .scalar;
                let next_cost = entry.cost + step;
                let next_hops = entry.hops + 1;
                let next_state = (edge.target, next_intermediates);

                // Strict improvement, with the hop count as the tie-break.
                // Equal (cost, hops) keeps the first-seen path, which is the
                // lexicographically smaller one because adjacency lists are
                // iterated in UN/LOCODE order.
                let improves = match best.get(&next_state) {
                    Some(&(cost, hops)) => (next_cost, next_hops) < (cost, hops),
                    None => true,
                };
                if improves {
                    best.insert(next_state, (next_cost, next_hops));
                    parents.insert(next_state, state);
                    heap.push(HeapEntry {
                        priority: next_cost + estimate(edge.target),
                        cost: next_cost,
                        hops: next_hops,
                        node: edge.target,
                        intermediates: next_intermediates,
                    });
                }
            }
        }

        Ok(None)
    }

    fn count_expansion(&self) -> Result<()> {
        let n = self.expansions.get() + 1;
        self.expansions.set(n);
        if n % self.params.cancel_check_interval == 0 {
            self.cancel.check()?;
        }
        Ok(())
    }
}

/// Order paths by cost, then fewer hops, then UN/LOCODE sequence.
fn compare_paths(a: &GraphPath, b: &GraphPath, graph: &PortGraph) -> Ordering {
    a.cost
        .partial_cmp(&b.cost)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.nodes.len().cmp(&b.nodes.len()))
        .then_with(|| {
            let codes_a: Vec<&str> = a.nodes.iter().map(|&n| graph.code(n)).collect();
            let codes_b: Vec<&str> = b.nodes.iter().map(|&n| graph.code(n)).collect();
            codes_a.cmp(&codes_b)
        })
}

fn reconstruct(
    parents: &HashMap<(NodeId, usize), (NodeId, usize)>,
    origin: NodeId,
    mut state: (NodeId, usize),
) -> Vec<NodeId> {
    let mut nodes = vec![state.0];
    while let Some(&prev) = parents.get(&state) {
        nodes.push(prev.0);
        state = prev;
    }
    debug_assert_eq!(*nodes.last().unwrap(), origin);
    nodes.reverse();
    nodes
}

/// Min-heap entry ordered by priority (cost plus heuristic), then hops.
struct HeapEntry {
    priority: f64,
    cost: f64,
    hops: u32,
    node: NodeId,
    intermediates: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest priority.
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.hops.cmp(&self.hops))
            .then_with(|| other.node.cmp(&self.node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PortCatalog;
    use crate::spatial::SpatialIndex;
    use crate::test_helpers::{
        container_vessel, scenario_catalog, scenario_config, search_params,
    };
    use crate::zones::ZoneMap;

    fn fixture() -> (PortCatalog, PortGraph) {
        let catalog = scenario_catalog();
        let index = SpatialIndex::build(&catalog);
        let graph = crate::graph::build_port_graph(
            &catalog,
            &index,
            &ZoneMap::default(),
            &scenario_config(),
        )
        .unwrap();
        (catalog, graph)
    }

    fn run(
        catalog: &PortCatalog,
        graph: &PortGraph,
        vessel: &VesselConstraints,
        params: SearchParams,
        from: &str,
        to: &str,
    ) -> PathfinderOutcome {
        let cost_model = CostModel::default();
        let cancel = CancelToken::unbounded();
        let finder = Pathfinder::new(graph, catalog, &cost_model, vessel, params, &cancel);
        finder
            .find_routes(graph.node_id(from).unwrap(), graph.node_id(to).unwrap())
            .unwrap()
    }

    #[test]
    fn primary_path_is_found_and_simple() {
        let (catalog, graph) = fixture();
        let vessel = container_vessel();
        let outcome = run(&catalog, &graph, &vessel, search_params(4, 6), "SGSIN", "NLRTM");
        assert!(!outcome.paths.is_empty());
        let primary = &outcome.paths[0];
        let mut seen = HashSet::new();
        assert!(primary.nodes.iter().all(|n| seen.insert(*n)), "loopless");
        assert_eq!(graph.code(primary.nodes[0]), "SGSIN");
        assert_eq!(graph.code(*primary.nodes.last().unwrap()), "NLRTM");
    }

    #[test]
    fn output_is_deterministic_across_runs() {
        let (catalog, graph) = fixture();
        let vessel = container_vessel();
        let a = run(&catalog, &graph, &vessel, search_params(4, 6), "SGSIN", "NLRTM");
        let b = run(&catalog, &graph, &vessel, search_params(4, 6), "SGSIN", "NLRTM");
        let nodes_a: Vec<_> = a.paths.iter().map(|p| p.nodes.clone()).collect();
        let nodes_b: Vec<_> = b.paths.iter().map(|p| p.nodes.clone()).collect();
        assert_eq!(nodes_a, nodes_b);
    }

    #[test]
    fn alternatives_are_distinct_and_cost_ordered() {
        let (catalog, graph) = fixture();
        let vessel = container_vessel();
        let outcome = run(&catalog, &graph, &vessel, search_params(4, 6), "SGSIN", "NLRTM");
        for pair in outcome.paths.windows(2) {
            assert!(pair[0].cost <= pair[1].cost);
            assert_ne!(pair[0].nodes, pair[1].nodes);
        }
    }

    #[test]
    fn hop_cap_prunes_long_paths() {
        let (catalog, graph) = fixture();
        let vessel = container_vessel();
        let outcome = run(&catalog, &graph, &vessel, search_params(4, 6), "SGSIN", "NLRTM");
        assert!(outcome
            .paths
            .iter()
            .all(|p| p.intermediates() <= 6));

        // A cap of one intermediate disconnects Singapore from Rotterdam.
        let strict = run(&catalog, &graph, &vessel, search_params(4, 1), "SGSIN", "NLRTM");
        assert!(strict.paths.is_empty());
    }

    #[test]
    fn legs_beyond_fuel_range_are_infeasible() {
        let (catalog, graph) = fixture();
        let mut vessel = container_vessel();
        // Shorter than every leg out of Singapore.
        vessel.max_range_nm = 1000.0;
        let outcome = run(&catalog, &graph, &vessel, search_params(4, 6), "SGSIN", "NLRTM");
        assert!(outcome.paths.is_empty());
    }

    #[test]
    fn infeasible_draft_yields_no_route() {
        let (catalog, graph) = fixture();
        let mut vessel = container_vessel();
        vessel.draft_m = 30.0;
        let outcome = run(&catalog, &graph, &vessel, search_params(4, 6), "SGSIN", "NLRTM");
        assert!(outcome.paths.is_empty());
    }

    #[test]
    fn cancellation_is_observed() {
        let (catalog, graph) = fixture();
        let vessel = container_vessel();
        let cost_model = CostModel::default();
        let cancel = CancelToken::unbounded();
        cancel.cancel();
        let mut params = search_params(4, 6);
        params.cancel_check_interval = 1;
        let finder = Pathfinder::new(&graph, &catalog, &cost_model, &vessel, params, &cancel);
        let err = finder
            .find_routes(
                graph.node_id("SGSIN").unwrap(),
                graph.node_id("NLRTM").unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn expired_deadline_reports_deadline_exceeded() {
        let (catalog, graph) = fixture();
        let vessel = container_vessel();
        let cost_model = CostModel::default();
        let cancel = CancelToken::with_deadline(Instant::now());
        let mut params = search_params(4, 6);
        params.cancel_check_interval = 1;
        let finder = Pathfinder::new(&graph, &catalog, &cost_model, &vessel, params, &cancel);
        let err = finder
            .find_routes(
                graph.node_id("SGSIN").unwrap(),
                graph.node_id("NLRTM").unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded));
    }
}
