//! Domain-level route calculation request and validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::port::{is_unlocode, OptimizationCriteria, VesselConstraints};

/// Hard cap on requested alternatives.
pub const MAX_ALTERNATIVES: usize = 10;
/// Hard cap on intermediate connecting ports.
pub const MAX_CONNECTING_PORTS: usize = 8;

/// A route calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Origin port UN/LOCODE.
    pub origin: String,
    /// Destination port UN/LOCODE.
    pub destination: String,
    pub vessel: VesselConstraints,
    #[serde(default)]
    pub criterion: OptimizationCriteria,
    #[serde(default = "Utc::now")]
    pub departure_time: DateTime<Utc>,
    #[serde(default = "default_alternatives")]
    pub max_alternative_routes: usize,
    #[serde(default = "default_connecting")]
    pub max_connecting_ports: usize,
    /// Requested timeout in seconds; clamped to the service default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_s: Option<u64>,
}

fn default_alternatives() -> usize {
    3
}

fn default_connecting() -> usize {
    2
}

impl RouteRequest {
    /// Validate the request shape: code syntax, distinct endpoints, vessel
    /// invariants, bounded alternative and hop counts. Port existence is
    /// checked later against the repository.
    pub fn validate(&self) -> Result<()> {
        if !is_unlocode(&self.origin) {
            return Err(Error::validation(format!(
                "origin {:?} is not a 5-letter UN/LOCODE",
                self.origin
            )));
        }
        if !is_unlocode(&self.destination) {
            return Err(Error::validation(format!(
                "destination {:?} is not a 5-letter UN/LOCODE",
                self.destination
            )));
        }
        if self.origin == self.destination {
            return Err(Error::validation(
                "origin and destination ports must be different",
            ));
        }
        self.vessel.validate()?;
        if self.max_alternative_routes > MAX_ALTERNATIVES {
            return Err(Error::validation(format!(
                "max_alternative_routes exceeds hard cap {MAX_ALTERNATIVES}"
            )));
        }
        if self.max_connecting_ports > MAX_CONNECTING_PORTS {
            return Err(Error::validation(format!(
                "max_connecting_ports exceeds hard cap {MAX_CONNECTING_PORTS}"
            )));
        }
        Ok(())
    }
}

/// Outcome of running validation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}
