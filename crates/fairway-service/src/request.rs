//! Request validation glue for the HTTP surface.

use serde::Deserialize;

use crate::envelope::ErrorEnvelope;
use fairway_lib::{RouteRequest, VesselType};

/// Validation for incoming request bodies, producing an error envelope.
pub trait Validate {
    fn validate(&self, request_id: &str) -> Result<(), Box<ErrorEnvelope>>;
}

impl Validate for RouteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ErrorEnvelope>> {
        RouteRequest::validate(self)
            .map_err(|err| Box::new(ErrorEnvelope::from_error(&err, request_id)))
    }
}

/// Query parameters for `GET /ports/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct PortSearchQuery {
    /// Search text; at least two characters.
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub country: Option<String>,
    /// Only ports compatible with this vessel type.
    #[serde(default)]
    pub vessel_type_compatible: Option<VesselType>,
    #[serde(default)]
    pub include_inactive: bool,
}

fn default_limit() -> usize {
    20
}

impl Validate for PortSearchQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ErrorEnvelope>> {
        if self.q.trim().len() < 2 {
            return Err(Box::new(ErrorEnvelope::bad_request(
                "The 'q' parameter must be at least 2 characters",
                request_id,
            )));
        }
        if self.limit == 0 || self.limit > 100 {
            return Err(Box::new(ErrorEnvelope::bad_request(
                "The 'limit' parameter must be between 1 and 100",
                request_id,
            )));
        }
        Ok(())
    }
}
