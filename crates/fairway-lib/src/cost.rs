//! Edge cost model.
//!
//! Given a vessel, an edge, and an optimization criterion, the model returns
//! a non-negative scalar cost plus a breakdown (distance, time, fuel, fees,
//! risk). All constants are table-driven through [`CostTables`] so a
//! deployment can override them from a data file; nothing is hard-coded at
//! use sites.

use serde::{Deserialize, Serialize};

use crate::graph::Edge;
use crate::port::{FuelType, OptimizationCriteria, Port, VesselConstraints, VesselType};

/// Tunable constants of the cost model, with built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTables {
    /// Fuel price per metric ton, USD.
    pub fuel_price_vlsfo: f64,
    pub fuel_price_mgo: f64,
    pub fuel_price_lng: f64,
    pub fuel_price_hfo: f64,
    /// Base daily consumption rate by vessel type, tons/day at design speed.
    pub base_rate_container: f64,
    pub base_rate_tanker: f64,
    pub base_rate_bulk: f64,
    pub base_rate_general_cargo: f64,
    pub base_rate_default: f64,
    /// Design speed the cube law is anchored at, knots.
    pub design_speed_knots: f64,
    /// Port fee model: flat base plus a per-deadweight-ton component, USD.
    pub port_fee_base: f64,
    pub port_fee_per_dwt: f64,
    /// Canal fee models as a function of deadweight tonnage, USD.
    pub suez_fee_base: f64,
    pub suez_fee_per_dwt: f64,
    pub panama_fee_base: f64,
    pub panama_fee_per_dwt: f64,
    /// Fixed normalization scales for the balanced criterion.
    pub norm_time_hours: f64,
    pub norm_cost_usd: f64,
    pub norm_risk: f64,
    /// Reference fuel intensity (tons per nautical mile) scoring 1 point of
    /// environmental impact.
    pub environmental_reference_tons_per_nm: f64,
}

impl Default for CostTables {
    fn default() -> Self {
        Self {
            fuel_price_vlsfo: 550.0,
            fuel_price_mgo: 650.0,
            fuel_price_lng: 400.0,
            fuel_price_hfo: 450.0,
            base_rate_container: 150.0,
            base_rate_tanker: 80.0,
            base_rate_bulk: 45.0,
            base_rate_general_cargo: 25.0,
            base_rate_default: 50.0,
            design_speed_knots: 15.0,
            port_fee_base: 6_000.0,
            port_fee_per_dwt: 0.45,
            suez_fee_base: 30_000.0,
            suez_fee_per_dwt: 0.8,
            panama_fee_base: 20_000.0,
            panama_fee_per_dwt: 0.6,
            norm_time_hours: 24.0,
            norm_cost_usd: 100_000.0,
            norm_risk: 100.0,
            environmental_reference_tons_per_nm: 0.01,
        }
    }
}

impl CostTables {
    pub fn fuel_price(&self, fuel: FuelType) -> f64 {
        match fuel {
            FuelType::Vlsfo => self.fuel_price_vlsfo,
            FuelType::Mgo => self.fuel_price_mgo,
            FuelType::Lng => self.fuel_price_lng,
            FuelType::Hfo => self.fuel_price_hfo,
        }
    }

    pub fn base_rate(&self, vessel_type: VesselType) -> f64 {
        match vessel_type {
            VesselType::Container => self.base_rate_container,
            VesselType::Tanker => self.base_rate_tanker,
            VesselType::BulkCarrier => self.base_rate_bulk,
            VesselType::GeneralCargo => self.base_rate_general_cargo,
            _ => self.base_rate_default,
        }
    }
}

/// Per-edge cost breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub distance_nm: f64,
    pub time_hours: f64,
    pub fuel_tons: f64,
    pub fuel_cost_usd: f64,
    /// Port fee allocated at the head of the edge.
    pub port_fee_usd: f64,
    pub canal_fee_usd: f64,
    /// Weather risk score, [0, 100], derived from the transit factor.
    pub weather_risk: f64,
    pub piracy_risk: f64,
    pub political_risk: f64,
    /// Blended risk score, [0, 100].
    pub risk: f64,
    /// Scalar cost under the requested criterion.
    pub scalar: f64,
}

/// The edge cost model: pure functions over the tables.
#[derive(Debug, Clone, Default)]
pub struct CostModel {
    tables: CostTables,
}

impl CostModel {
    pub fn new(tables: CostTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &CostTables {
        &self.tables
    }

    /// Effective transit speed on an edge for a vessel.
    pub fn edge_speed(&self, edge: &Edge, vessel: &VesselConstraints) -> f64 {
        match edge.speed_cap_knots {
            Some(cap) => vessel.cruise_speed_knots.min(cap),
            None => vessel.cruise_speed_knots,
        }
    }

    /// Full breakdown for traversing `edge` toward `head_port`.
    pub fn edge_cost(
        &self,
        edge: &Edge,
        head_port: &Port,
        vessel: &VesselConstraints,
        criterion: OptimizationCriteria,
    ) -> CostBreakdown {
        let t = &self.tables;
        let speed = self.edge_speed(edge, vessel);
        let time_hours = edge.distance_nm / speed * edge.congestion * edge.weather_factor;

        let rate = t.base_rate(vessel.vessel_type);
        let fuel_tons = rate * (speed / t.design_speed_knots).powi(3) * (time_hours / 24.0);
        let fuel_cost_usd = fuel_tons * t.fuel_price(vessel.fuel_type);

        let port_fee_usd = self.port_call_fee(head_port, vessel);
        let canal_fee_usd = self.canal_fee(edge, vessel);

        let weather_risk = weather_factor_to_risk(edge.weather_factor);
        let risk = 0.5 * weather_risk + 0.3 * edge.piracy_risk + 0.2 * edge.political_risk;

        let scalar = match criterion {
            OptimizationCriteria::Fastest => time_hours,
            OptimizationCriteria::MostEconomical => fuel_cost_usd + port_fee_usd + canal_fee_usd,
            OptimizationCriteria::MostReliable => time_hours * (1.0 + risk / 100.0).powi(2),
            OptimizationCriteria::Balanced => {
                0.4 * (time_hours / t.norm_time_hours)
                    + 0.35 * ((fuel_cost_usd + port_fee_usd + canal_fee_usd) / t.norm_cost_usd)
                    + 0.25 * (risk / t.norm_risk)
            }
        };

        CostBreakdown {
            distance_nm: edge.distance_nm,
            time_hours,
            fuel_tons,
            fuel_cost_usd,
            port_fee_usd,
            canal_fee_usd,
            weather_risk,
            piracy_risk: edge.piracy_risk,
            political_risk: edge.political_risk,
            risk,
            scalar,
        }
    }

    /// Fee for one call at a port.
    pub fn port_call_fee(&self, port: &Port, vessel: &VesselConstraints) -> f64 {
        let t = &self.tables;
        let base = t.port_fee_base + t.port_fee_per_dwt * vessel.deadweight_or_default();
        port.congestion_factor * base
    }

    /// Canal transit fee; zero for non-canal edges.
    pub fn canal_fee(&self, edge: &Edge, vessel: &VesselConstraints) -> f64 {
        let t = &self.tables;
        let dwt = vessel.deadweight_or_default();
        match edge.kind {
            crate::graph::EdgeKind::CanalSuez => t.suez_fee_base + t.suez_fee_per_dwt * dwt,
            crate::graph::EdgeKind::CanalPanama => t.panama_fee_base + t.panama_fee_per_dwt * dwt,
            _ => 0.0,
        }
    }

    /// Admissible lower bound on cost per nautical mile, used as the A*
    /// heuristic multiplier. Only `fastest` and `balanced` have a cheap bound
    /// that stays below every achievable per-mile cost.
    pub fn min_cost_per_nm(
        &self,
        vessel: &VesselConstraints,
        criterion: OptimizationCriteria,
    ) -> Option<f64> {
        match criterion {
            OptimizationCriteria::Fastest => Some(1.0 / vessel.cruise_speed_knots),
            OptimizationCriteria::Balanced => {
                Some(0.4 / (vessel.cruise_speed_knots * self.tables.norm_time_hours))
            }
            _ => None,
        }
    }
}

/// Map a weather transit factor (>= 1.0) onto a risk score in [0, 100].
/// A factor of 1.5 or worse saturates the scale.
fn weather_factor_to_risk(factor: f64) -> f64 {
    ((factor - 1.0) * 200.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use crate::test_helpers::{container_vessel, port_at};

    fn open_sea_edge(distance: f64) -> Edge {
        Edge {
            target: 0,
            kind: EdgeKind::OpenSea,
            distance_nm: distance,
            congestion: 1.0,
            weather_factor: 1.0,
            piracy_risk: 0.0,
            political_risk: 0.0,
            speed_cap_knots: None,
        }
    }

    #[test]
    fn time_follows_distance_over_speed() {
        let model = CostModel::default();
        let vessel = container_vessel();
        let head = port_at("AAAAA", 0.0, 0.0);
        let cost = model.edge_cost(
            &open_sea_edge(180.0),
            &head,
            &vessel,
            OptimizationCriteria::Fastest,
        );
        assert!((cost.time_hours - 10.0).abs() < 1e-9); // 180 nm at 18 kn
        assert_eq!(cost.scalar, cost.time_hours);
    }

    #[test]
    fn canal_speed_cap_slows_transit() {
        let model = CostModel::default();
        let vessel = container_vessel();
        let head = port_at("AAAAA", 0.0, 0.0);
        let mut edge = open_sea_edge(80.0);
        edge.kind = EdgeKind::CanalSuez;
        edge.speed_cap_knots = Some(8.0);
        edge.congestion = 1.1;
        let cost = model.edge_cost(&edge, &head, &vessel, OptimizationCriteria::Fastest);
        assert!((cost.time_hours - 80.0 / 8.0 * 1.1).abs() < 1e-9);
        assert!(cost.canal_fee_usd > 0.0);
    }

    #[test]
    fn fuel_cube_law() {
        let model = CostModel::default();
        let mut vessel = container_vessel();
        let head = port_at("AAAAA", 0.0, 0.0);
        let edge = open_sea_edge(360.0);

        vessel.cruise_speed_knots = 15.0;
        let at_design = model.edge_cost(&edge, &head, &vessel, OptimizationCriteria::Fastest);
        // 24 h at design speed burns exactly the base rate.
        assert!((at_design.fuel_tons - 150.0).abs() < 1e-6);

        vessel.cruise_speed_knots = 30.0;
        let doubled = model.edge_cost(&edge, &head, &vessel, OptimizationCriteria::Fastest);
        // Twice the speed: half the time, eight times the burn rate.
        assert!((doubled.fuel_tons / at_design.fuel_tons - 4.0).abs() < 1e-6);
    }

    #[test]
    fn reliability_penalizes_risk() {
        let model = CostModel::default();
        let vessel = container_vessel();
        let head = port_at("AAAAA", 0.0, 0.0);
        let calm = open_sea_edge(180.0);
        let mut risky = open_sea_edge(180.0);
        risky.piracy_risk = 100.0;

        let a = model.edge_cost(&calm, &head, &vessel, OptimizationCriteria::MostReliable);
        let b = model.edge_cost(&risky, &head, &vessel, OptimizationCriteria::MostReliable);
        assert!(b.scalar > a.scalar);
        assert_eq!(a.time_hours, b.time_hours);
    }

    #[test]
    fn balanced_heuristic_bound_is_admissible() {
        let model = CostModel::default();
        let vessel = container_vessel();
        let head = port_at("AAAAA", 0.0, 0.0);
        let per_nm = model
            .min_cost_per_nm(&vessel, OptimizationCriteria::Balanced)
            .unwrap();
        for dist in [50.0, 500.0, 5000.0] {
            let cost = model.edge_cost(
                &open_sea_edge(dist),
                &head,
                &vessel,
                OptimizationCriteria::Balanced,
            );
            assert!(per_nm * dist <= cost.scalar + 1e-9);
        }
    }

    #[test]
    fn economical_criterion_has_no_heuristic() {
        let model = CostModel::default();
        let vessel = container_vessel();
        assert!(model
            .min_cost_per_nm(&vessel, OptimizationCriteria::MostEconomical)
            .is_none());
    }
}
