//! Port and vessel domain types.
//!
//! Plain value records: the catalog is read-only from the core's perspective
//! and everything here is `serde`-friendly for the data file and the HTTP
//! surface.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Position;

/// Maritime vessel types following IMO classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselType {
    Container,
    BulkCarrier,
    Tanker,
    GasCarrier,
    GeneralCargo,
    Roro,
    Passenger,
}

impl VesselType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VesselType::Container => "container",
            VesselType::BulkCarrier => "bulk_carrier",
            VesselType::Tanker => "tanker",
            VesselType::GasCarrier => "gas_carrier",
            VesselType::GeneralCargo => "general_cargo",
            VesselType::Roro => "roro",
            VesselType::Passenger => "passenger",
        }
    }
}

/// Port classification by primary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    ContainerTerminal,
    BulkTerminal,
    TankerTerminal,
    GeneralCargo,
    Multipurpose,
    Passenger,
    Fishing,
}

impl PortType {
    /// Whether ports of this type are eligible for hub selection.
    pub fn is_hub_candidate(&self) -> bool {
        matches!(self, PortType::Multipurpose | PortType::ContainerTerminal)
    }
}

/// Port operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalStatus {
    Active,
    Restricted,
    Maintenance,
    Inactive,
}

impl OperationalStatus {
    /// Active and restricted ports accept traffic; the rest do not.
    pub fn accepts_traffic(&self) -> bool {
        matches!(self, OperationalStatus::Active | OperationalStatus::Restricted)
    }
}

/// Marine fuel grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Vlsfo,
    Mgo,
    Lng,
    Hfo,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Vlsfo => "vlsfo",
            FuelType::Mgo => "mgo",
            FuelType::Lng => "lng",
            FuelType::Hfo => "hfo",
        }
    }
}

/// Route optimization criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationCriteria {
    Fastest,
    MostEconomical,
    MostReliable,
    #[default]
    Balanced,
}

impl OptimizationCriteria {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationCriteria::Fastest => "fastest",
            OptimizationCriteria::MostEconomical => "most_economical",
            OptimizationCriteria::MostReliable => "most_reliable",
            OptimizationCriteria::Balanced => "balanced",
        }
    }
}

/// A port in the global catalog.
///
/// Identity is the 5-letter UN/LOCODE. Records are created and updated by
/// catalog ingestion outside this crate and are read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// 5-letter UN/LOCODE, e.g. `SGSIN`.
    pub unlocode: String,
    pub name: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    pub position: Position,
    #[serde(default = "default_port_type")]
    pub port_type: PortType,
    #[serde(default = "default_status")]
    pub status: OperationalStatus,
    /// Maximum accepted vessel length in meters, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_vessel_length_m: Option<f64>,
    /// Maximum accepted vessel beam in meters, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_vessel_beam_m: Option<f64>,
    /// Maximum accepted draft in meters, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_draft_m: Option<f64>,
    #[serde(default)]
    pub berths: u32,
    /// Congestion multiplier, [0.5, 3.0].
    #[serde(default = "default_congestion")]
    pub congestion_factor: f64,
    /// Average time spent in port, hours.
    #[serde(default = "default_port_stay")]
    pub average_port_stay_hours: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
}

fn default_port_type() -> PortType {
    PortType::Multipurpose
}
fn default_status() -> OperationalStatus {
    OperationalStatus::Active
}
fn default_congestion() -> f64 {
    1.0
}
fn default_port_stay() -> f64 {
    24.0
}

impl Port {
    /// Validate catalog invariants: code shape, coordinate ranges, strictly
    /// positive dimension limits, congestion range.
    pub fn validate(&self) -> Result<()> {
        if !is_unlocode(&self.unlocode) {
            return Err(Error::validation(format!(
                "port code {:?} is not a 5-letter UN/LOCODE",
                self.unlocode
            )));
        }
        if !self.position.is_valid() {
            return Err(Error::validation(format!(
                "port {} has coordinates out of range",
                self.unlocode
            )));
        }
        for (label, value) in [
            ("max_vessel_length_m", self.max_vessel_length_m),
            ("max_vessel_beam_m", self.max_vessel_beam_m),
            ("max_draft_m", self.max_draft_m),
        ] {
            if let Some(v) = value {
                if !(v > 0.0) {
                    return Err(Error::validation(format!(
                        "port {}: {label} must be strictly positive",
                        self.unlocode
                    )));
                }
            }
        }
        if !(0.5..=3.0).contains(&self.congestion_factor) {
            return Err(Error::validation(format!(
                "port {}: congestion factor {} outside [0.5, 3.0]",
                self.unlocode, self.congestion_factor
            )));
        }
        Ok(())
    }

    /// Check whether the port can accommodate the given vessel dimensions.
    /// Absent limits are treated as unrestricted.
    pub fn accommodates(&self, length_m: f64, beam_m: f64, draft_m: f64) -> bool {
        if self.max_vessel_length_m.is_some_and(|max| length_m > max) {
            return false;
        }
        if self.max_vessel_beam_m.is_some_and(|max| beam_m > max) {
            return false;
        }
        if self.max_draft_m.is_some_and(|max| draft_m > max) {
            return false;
        }
        true
    }
}

/// Validate the `^[A-Z]{5}$` UN/LOCODE shape.
pub fn is_unlocode(code: &str) -> bool {
    code.len() == 5 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Vessel specification and constraints for a route request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselConstraints {
    pub vessel_type: VesselType,
    pub length_m: f64,
    pub beam_m: f64,
    pub draft_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadweight_tonnage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_tonnage: Option<f64>,
    pub cruise_speed_knots: f64,
    pub max_speed_knots: f64,
    /// Maximum fuel range in nautical miles.
    #[serde(default = "default_range")]
    pub max_range_nm: f64,
    #[serde(default = "default_fuel")]
    pub fuel_type: FuelType,
    #[serde(default = "default_true")]
    pub suez_canal_compatible: bool,
    #[serde(default = "default_true")]
    pub panama_canal_compatible: bool,
}

fn default_range() -> f64 {
    10_000.0
}
fn default_fuel() -> FuelType {
    FuelType::Vlsfo
}
fn default_true() -> bool {
    true
}

impl VesselConstraints {
    /// Validate the invariants of the vessel record: positive dimensions,
    /// `beam <= length`, `1 <= cruise <= max <= 40` knots.
    pub fn validate(&self) -> Result<()> {
        for (label, v) in [
            ("length_m", self.length_m),
            ("beam_m", self.beam_m),
            ("draft_m", self.draft_m),
        ] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(Error::validation(format!(
                    "vessel {label} must be strictly positive"
                )));
            }
        }
        if self.beam_m > self.length_m {
            return Err(Error::validation("vessel beam exceeds length"));
        }
        if !(1.0..=40.0).contains(&self.cruise_speed_knots)
            || !(1.0..=40.0).contains(&self.max_speed_knots)
            || self.cruise_speed_knots > self.max_speed_knots
        {
            return Err(Error::validation(
                "vessel speeds must satisfy 1 <= cruise <= max <= 40 knots",
            ));
        }
        for (label, v) in [
            ("deadweight_tonnage", self.deadweight_tonnage),
            ("gross_tonnage", self.gross_tonnage),
        ] {
            if let Some(v) = v {
                if !(v > 0.0) {
                    return Err(Error::validation(format!(
                        "vessel {label} must be strictly positive"
                    )));
                }
            }
        }
        if !(self.max_range_nm > 0.0) {
            return Err(Error::validation("vessel max range must be positive"));
        }
        Ok(())
    }

    /// Deadweight with the standard fallback used by fee formulas.
    pub fn deadweight_or_default(&self) -> f64 {
        self.deadweight_tonnage.unwrap_or(30_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel() -> VesselConstraints {
        VesselConstraints {
            vessel_type: VesselType::Container,
            length_m: 300.0,
            beam_m: 45.0,
            draft_m: 14.0,
            deadweight_tonnage: Some(80_000.0),
            gross_tonnage: None,
            cruise_speed_knots: 18.0,
            max_speed_knots: 24.0,
            max_range_nm: 12_000.0,
            fuel_type: FuelType::Vlsfo,
            suez_canal_compatible: true,
            panama_canal_compatible: true,
        }
    }

    #[test]
    fn unlocode_shape() {
        assert!(is_unlocode("SGSIN"));
        assert!(!is_unlocode("sgsin"));
        assert!(!is_unlocode("SGSI"));
        assert!(!is_unlocode("SGSIN1"));
        assert!(!is_unlocode("SGS1N"));
    }

    #[test]
    fn vessel_validation_accepts_sane_vessel() {
        assert!(vessel().validate().is_ok());
    }

    #[test]
    fn vessel_beam_must_not_exceed_length() {
        let mut v = vessel();
        v.beam_m = 400.0;
        assert!(v.validate().is_err());
    }

    #[test]
    fn vessel_speed_ordering_enforced() {
        let mut v = vessel();
        v.cruise_speed_knots = 30.0;
        v.max_speed_knots = 20.0;
        assert!(v.validate().is_err());
    }

    #[test]
    fn port_accommodates_respects_limits() {
        let port = Port {
            unlocode: "SGSIN".into(),
            name: "Singapore".into(),
            country: "SG".into(),
            position: Position::new(1.2644, 103.84),
            port_type: PortType::ContainerTerminal,
            status: OperationalStatus::Active,
            max_vessel_length_m: Some(400.0),
            max_vessel_beam_m: Some(60.0),
            max_draft_m: Some(16.0),
            berths: 60,
            congestion_factor: 1.2,
            average_port_stay_hours: 20.0,
            services: vec![],
        };
        assert!(port.accommodates(300.0, 45.0, 14.0));
        assert!(!port.accommodates(300.0, 45.0, 30.0));
        assert!(!port.accommodates(450.0, 45.0, 14.0));
    }

    #[test]
    fn inactive_ports_refuse_traffic() {
        assert!(OperationalStatus::Active.accepts_traffic());
        assert!(OperationalStatus::Restricted.accepts_traffic());
        assert!(!OperationalStatus::Maintenance.accepts_traffic());
        assert!(!OperationalStatus::Inactive.accepts_traffic());
    }
}
