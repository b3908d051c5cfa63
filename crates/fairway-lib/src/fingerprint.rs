//! Request fingerprinting.
//!
//! The fingerprint is a SHA-256 digest over a canonical bytestring of the
//! request fields that influence the computed routes. Field ordering is fixed
//! by construction here, so the digest is insensitive to the ordering of the
//! incoming JSON. Two requests with the same fingerprint yield identical
//! responses (timestamps aside), which is what makes the cache key and the
//! single-flight registry sound.

use std::fmt::Write as _;

use chrono::Timelike;
use sha2::{Digest, Sha256};

use crate::request::RouteRequest;

/// A request fingerprint: the lowercase hex SHA-256 of the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a request.
pub fn fingerprint(request: &RouteRequest) -> Fingerprint {
    let mut canonical = String::with_capacity(160);
    let vessel = &request.vessel;

    // One `key=value` token per field, fixed order, versioned prefix.
    let _ = write!(
        canonical,
        "v1|origin={}|destination={}|vtype={}|len={}|beam={}|draft={}|dwt={}|cruise={}|max={}|range={}|fuel={}|suez={}|panama={}|criterion={}|alts={}|hops={}|depart={}",
        request.origin,
        request.destination,
        vessel.vessel_type.as_str(),
        round_half(vessel.length_m),
        round_half(vessel.beam_m),
        round_half(vessel.draft_m),
        vessel
            .deadweight_tonnage
            .map_or_else(|| "none".to_string(), |v| format!("{:.0}", (v / 500.0).round() * 500.0)),
        round_half(vessel.cruise_speed_knots),
        round_half(vessel.max_speed_knots),
        format!("{:.0}", (vessel.max_range_nm / 500.0).round() * 500.0),
        vessel.fuel_type.as_str(),
        vessel.suez_canal_compatible,
        vessel.panama_canal_compatible,
        request.criterion.as_str(),
        request.max_alternative_routes,
        request.max_connecting_ports,
        departure_bucket(request),
    );

    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    Fingerprint(hex)
}

/// Round to the nearest 0.5 and format without float noise.
fn round_half(value: f64) -> String {
    format!("{:.1}", (value * 2.0).round() / 2.0)
}

/// Departure time bucketed to the hour (UTC).
fn departure_bucket(request: &RouteRequest) -> String {
    request
        .departure_time
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(request.departure_time)
        .format("%Y-%m-%dT%H")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::test_helpers::route_request;

    #[test]
    fn fingerprint_is_a_pure_function() {
        let request = route_request("SGSIN", "NLRTM");
        assert_eq!(fingerprint(&request), fingerprint(&request));
    }

    #[test]
    fn dimension_rounding_buckets_nearby_vessels() {
        let mut a = route_request("SGSIN", "NLRTM");
        let mut b = route_request("SGSIN", "NLRTM");
        a.vessel.length_m = 300.1;
        b.vessel.length_m = 299.9;
        // Both round to 300.0.
        assert_eq!(fingerprint(&a), fingerprint(&b));

        b.vessel.length_m = 301.0;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn departure_buckets_to_the_hour() {
        let mut a = route_request("SGSIN", "NLRTM");
        let mut b = route_request("SGSIN", "NLRTM");
        a.departure_time = Utc.with_ymd_and_hms(2025, 3, 14, 9, 5, 0).unwrap();
        b.departure_time = Utc.with_ymd_and_hms(2025, 3, 14, 9, 55, 0).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));

        b.departure_time += Duration::hours(1);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn canal_flags_change_the_fingerprint() {
        let a = route_request("AEJEA", "BEANR");
        let mut b = route_request("AEJEA", "BEANR");
        b.vessel.suez_canal_compatible = false;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn criterion_and_caps_change_the_fingerprint() {
        let a = route_request("SGSIN", "NLRTM");
        let mut b = a.clone();
        b.criterion = crate::port::OptimizationCriteria::Fastest;
        assert_ne!(fingerprint(&a), fingerprint(&b));

        let mut c = a.clone();
        c.max_alternative_routes = 5;
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn hex_shape() {
        let fp = fingerprint(&route_request("SGSIN", "NLRTM"));
        assert_eq!(fp.as_hex().len(), 64);
        assert!(fp.as_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
