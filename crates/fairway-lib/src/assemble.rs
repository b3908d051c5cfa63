//! Route assembly: expand a graph path into a `DetailedRoute`.
//!
//! Each leg becomes a segment with interpolated waypoints and per-segment
//! metrics; port fees land on the destination end of every leg, port-stay
//! hours on intermediate ports, and the aggregates feed the scoring formulas.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::PortCatalog;
use crate::cost::CostModel;
use crate::geo::{distance_nm, initial_bearing, interpolate, Position};
use crate::graph::{EdgeKind, PortGraph};
use crate::path::GraphPath;
use crate::port::{OptimizationCriteria, VesselConstraints};

/// Upper bound on interpolated waypoints per segment.
const MAX_WAYPOINTS: usize = 32;
/// Nautical miles of leg distance per interpolated waypoint.
const WAYPOINT_SPACING_NM: f64 = 150.0;
/// Fixed approach/departure overhead per segment, hours.
const APPROACH_HOURS: f64 = 2.0;

/// One leg of an assembled route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub order: usize,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub distance_nm: f64,
    pub initial_bearing_deg: f64,
    pub transit_hours: f64,
    /// Stay at the head port; zero on the final segment.
    pub port_stay_hours: f64,
    pub fuel_tons: f64,
    pub fuel_cost_usd: f64,
    pub port_fee_usd: f64,
    pub canal_fee_usd: f64,
    pub weather_risk: f64,
    pub piracy_risk: f64,
    pub political_risk: f64,
    pub risk: f64,
    /// Estimated arrival at the head port.
    pub eta: DateTime<Utc>,
    /// Great-circle waypoints including both endpoints, at most 32.
    pub waypoints: Vec<Position>,
}

/// A fully expanded route with aggregates and scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedRoute {
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub intermediate_ports: Vec<String>,
    pub segments: Vec<RouteSegment>,
    pub total_distance_nm: f64,
    /// Transit plus approach plus intermediate port stays, hours.
    pub total_time_hours: f64,
    pub total_fuel_tons: f64,
    pub total_fuel_cost_usd: f64,
    pub total_port_fees_usd: f64,
    pub total_canal_fees_usd: f64,
    pub total_cost_usd: f64,
    pub efficiency_score: f64,
    pub reliability_score: f64,
    pub environmental_impact_score: f64,
    pub overall_optimization_score: f64,
    pub overall_risk_score: f64,
    pub criterion: OptimizationCriteria,
}

impl DetailedRoute {
    /// Whether any segment transits a canal.
    pub fn uses_canal(&self) -> bool {
        self.segments.iter().any(|s| s.kind.is_canal())
    }
}

/// Expand a graph path into a detailed route.
///
/// The path is assumed feasible (the pathfinder only emits feasible paths);
/// missing catalog entries would be an invariant violation upstream.
pub fn assemble_route(
    path: &GraphPath,
    graph: &PortGraph,
    catalog: &PortCatalog,
    cost_model: &CostModel,
    vessel: &VesselConstraints,
    criterion: OptimizationCriteria,
    departure_time: DateTime<Utc>,
) -> DetailedRoute {
    let codes: Vec<&str> = path.nodes.iter().map(|&n| graph.code(n)).collect();
    let last_index = path.nodes.len() - 1;

    let mut segments = Vec::with_capacity(last_index);
    let mut clock = departure_time;
    let mut total_distance = 0.0;
    let mut total_time = 0.0;
    let mut total_fuel = 0.0;
    let mut total_fuel_cost = 0.0;
    let mut total_port_fees = 0.0;
    let mut total_canal_fees = 0.0;
    let mut distance_weighted_risk = 0.0;

    for (i, pair) in path.nodes.windows(2).enumerate() {
        let edge = graph
            .edge_between(pair[0], pair[1])
            .expect("assembled path uses existing edges");
        let tail = catalog
            .get(graph.code(pair[0]))
            .expect("path ports exist in catalog");
        let head = catalog
            .get(graph.code(pair[1]))
            .expect("path ports exist in catalog");

        let breakdown = cost_model.edge_cost(edge, head, vessel, criterion);
        let is_terminal = i + 1 == last_index;
        let stay_hours = if is_terminal {
            0.0
        } else {
            head.average_port_stay_hours
        };

        let segment_hours = breakdown.time_hours + APPROACH_HOURS;
        clock += hours(segment_hours);
        let eta = clock;
        clock += hours(stay_hours);

        let waypoint_steps = ((edge.distance_nm / WAYPOINT_SPACING_NM) as usize)
            .clamp(1, MAX_WAYPOINTS - 1);
        segments.push(RouteSegment {
            order: i + 1,
            from: tail.unlocode.clone(),
            to: head.unlocode.clone(),
            kind: edge.kind,
            distance_nm: edge.distance_nm,
            initial_bearing_deg: initial_bearing(tail.position, head.position),
            transit_hours: breakdown.time_hours,
            port_stay_hours: stay_hours,
            fuel_tons: breakdown.fuel_tons,
            fuel_cost_usd: breakdown.fuel_cost_usd,
            port_fee_usd: breakdown.port_fee_usd,
            canal_fee_usd: breakdown.canal_fee_usd,
            weather_risk: breakdown.weather_risk,
            piracy_risk: breakdown.piracy_risk,
            political_risk: breakdown.political_risk,
            risk: breakdown.risk,
            eta,
            waypoints: interpolate(tail.position, head.position, waypoint_steps),
        });

        total_distance += edge.distance_nm;
        total_time += segment_hours + stay_hours;
        total_fuel += breakdown.fuel_tons;
        total_fuel_cost += breakdown.fuel_cost_usd;
        total_port_fees += breakdown.port_fee_usd;
        total_canal_fees += breakdown.canal_fee_usd;
        distance_weighted_risk += breakdown.risk * edge.distance_nm;
    }

    let origin_port = catalog.get(codes[0]).expect("origin exists");
    let destination_port = catalog.get(codes[last_index]).expect("destination exists");
    let direct_distance = distance_nm(origin_port.position, destination_port.position);

    let overall_risk = if total_distance > 0.0 {
        (distance_weighted_risk / total_distance).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let efficiency = if total_distance > 0.0 {
        (100.0 * direct_distance / total_distance).clamp(0.0, 100.0)
    } else {
        100.0
    };
    let reliability = (100.0 - overall_risk).clamp(0.0, 100.0);
    let fuel_per_nm = if total_distance > 0.0 {
        total_fuel / total_distance
    } else {
        0.0
    };
    let environmental = (100.0
        - fuel_per_nm / cost_model.tables().environmental_reference_tons_per_nm)
        .clamp(0.0, 100.0);
    let overall = overall_score(criterion, efficiency, reliability, environmental);

    let intermediates: Vec<String> = codes[1..last_index]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let name = if intermediates.is_empty() {
        format!("{} → {}", codes[0], codes[last_index])
    } else {
        format!(
            "{} → {} via {}",
            codes[0],
            codes[last_index],
            intermediates.join(", ")
        )
    };

    DetailedRoute {
        name,
        origin: codes[0].to_string(),
        destination: codes[last_index].to_string(),
        intermediate_ports: intermediates,
        segments,
        total_distance_nm: total_distance,
        total_time_hours: total_time,
        total_fuel_tons: total_fuel,
        total_fuel_cost_usd: total_fuel_cost,
        total_port_fees_usd: total_port_fees,
        total_canal_fees_usd: total_canal_fees,
        total_cost_usd: total_fuel_cost + total_port_fees + total_canal_fees,
        efficiency_score: efficiency,
        reliability_score: reliability,
        environmental_impact_score: environmental,
        overall_optimization_score: overall,
        overall_risk_score: overall_risk,
        criterion,
    }
}

/// Blend the component scores with criterion-specific weights.
fn overall_score(
    criterion: OptimizationCriteria,
    efficiency: f64,
    reliability: f64,
    environmental: f64,
) -> f64 {
    let score = match criterion {
        OptimizationCriteria::Fastest => {
            0.6 * efficiency + 0.3 * reliability + 0.1 * environmental
        }
        OptimizationCriteria::MostEconomical => {
            0.4 * efficiency + 0.2 * reliability + 0.4 * environmental
        }
        OptimizationCriteria::MostReliable => {
            0.3 * efficiency + 0.6 * reliability + 0.1 * environmental
        }
        OptimizationCriteria::Balanced => (efficiency + reliability + environmental) / 3.0,
    };
    score.clamp(0.0, 100.0)
}

fn hours(h: f64) -> Duration {
    Duration::milliseconds((h * 3_600_000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostModel;
    use crate::path::{CancelToken, Pathfinder};
    use crate::spatial::SpatialIndex;
    use crate::test_helpers::{
        container_vessel, scenario_catalog, scenario_config, search_params,
    };
    use crate::zones::ZoneMap;

    fn assembled(from: &str, to: &str) -> DetailedRoute {
        let catalog = scenario_catalog();
        let index = SpatialIndex::build(&catalog);
        let graph = crate::graph::build_port_graph(
            &catalog,
            &index,
            &ZoneMap::default(),
            &scenario_config(),
        )
        .unwrap();
        let cost_model = CostModel::default();
        let vessel = container_vessel();
        let cancel = CancelToken::unbounded();
        let finder = Pathfinder::new(
            &graph,
            &catalog,
            &cost_model,
            &vessel,
            search_params(1, 6),
            &cancel,
        );
        let outcome = finder
            .find_routes(graph.node_id(from).unwrap(), graph.node_id(to).unwrap())
            .unwrap();
        assemble_route(
            &outcome.paths[0],
            &graph,
            &catalog,
            &cost_model,
            &vessel,
            OptimizationCriteria::Balanced,
            Utc::now(),
        )
    }

    #[test]
    fn segment_distances_sum_to_total() {
        let route = assembled("SGSIN", "NLRTM");
        let sum: f64 = route.segments.iter().map(|s| s.distance_nm).sum();
        assert!((sum - route.total_distance_nm).abs() < 1e-6);
    }

    #[test]
    fn waypoints_are_bounded_and_include_endpoints() {
        let route = assembled("SGSIN", "NLRTM");
        for segment in &route.segments {
            assert!(segment.waypoints.len() >= 2);
            assert!(segment.waypoints.len() <= 32);
        }
    }

    #[test]
    fn port_stay_applies_to_intermediates_only() {
        let route = assembled("SGSIN", "NLRTM");
        let (last, rest) = route.segments.split_last().unwrap();
        assert_eq!(last.port_stay_hours, 0.0);
        assert!(rest.iter().all(|s| s.port_stay_hours > 0.0));
    }

    #[test]
    fn fees_charged_at_every_head_port() {
        let route = assembled("SGSIN", "NLRTM");
        assert!(route.segments.iter().all(|s| s.port_fee_usd > 0.0));
        let fee_sum: f64 = route.segments.iter().map(|s| s.port_fee_usd).sum();
        assert!((fee_sum - route.total_port_fees_usd).abs() < 1e-6);
    }

    #[test]
    fn etas_are_monotonic() {
        let route = assembled("SGSIN", "NLRTM");
        for pair in route.segments.windows(2) {
            assert!(pair[0].eta < pair[1].eta);
        }
    }

    #[test]
    fn scores_stay_in_range() {
        let route = assembled("SGSIN", "NLRTM");
        for score in [
            route.efficiency_score,
            route.reliability_score,
            route.environmental_impact_score,
            route.overall_optimization_score,
            route.overall_risk_score,
        ] {
            assert!((0.0..=100.0).contains(&score), "score {score} out of range");
        }
        // A detour route can never be 100% efficient.
        assert!(route.efficiency_score < 100.0);
    }

    #[test]
    fn suez_leg_is_flagged_on_the_route() {
        let route = assembled("SGSIN", "NLRTM");
        assert!(route.uses_canal());
        assert!(route.total_canal_fees_usd > 0.0);
    }
}
