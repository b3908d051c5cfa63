//! Fingerprint and cache round-trip properties.

use std::time::Duration;

use chrono::Utc;
use fairway_lib::cache::{decode_response, encode_response, route_key, MemoryCache, RouteCache};
use fairway_lib::test_helpers::route_request;
use fairway_lib::{fingerprint, OptimizationCriteria, RouteRequest, RouteResponse};

#[test]
fn fingerprint_is_insensitive_to_json_field_ordering() {
    let a: RouteRequest = serde_json::from_str(
        r#"{
            "origin": "SGSIN",
            "destination": "NLRTM",
            "criterion": "balanced",
            "departure_time": "2025-06-01T12:00:00Z",
            "vessel": {
                "vessel_type": "container",
                "length_m": 300.0, "beam_m": 45.0, "draft_m": 14.0,
                "cruise_speed_knots": 18.0, "max_speed_knots": 24.0
            }
        }"#,
    )
    .unwrap();
    let b: RouteRequest = serde_json::from_str(
        r#"{
            "vessel": {
                "max_speed_knots": 24.0, "cruise_speed_knots": 18.0,
                "draft_m": 14.0, "beam_m": 45.0, "length_m": 300.0,
                "vessel_type": "container"
            },
            "departure_time": "2025-06-01T12:00:00Z",
            "criterion": "balanced",
            "destination": "NLRTM",
            "origin": "SGSIN"
        }"#,
    )
    .unwrap();
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn cache_round_trip_is_byte_for_byte() {
    let response = RouteResponse {
        request_id: "11111111-2222-3333-4444-555555555555".into(),
        calculated_at: Utc::now(),
        calculation_duration_ms: 12,
        primary_route: None,
        alternative_routes: Vec::new(),
        algorithm: "a_star".into(),
        criterion: OptimizationCriteria::Balanced,
        routes_evaluated: 7,
        cache_hit: false,
        diagnostics: vec!["no feasible path within 2 connecting ports".into()],
    };

    let cache = MemoryCache::new();
    let fp = fingerprint(&route_request("SGSIN", "NLRTM"));
    let key = route_key(&fp);
    let bytes = encode_response(&response).unwrap();
    cache
        .put(&key, bytes.clone(), Duration::from_secs(60))
        .unwrap();

    let read = cache.get(&key).unwrap().expect("entry present");
    assert_eq!(read, bytes, "stored bytes are returned verbatim");

    let decoded = decode_response(&read).unwrap();
    assert!(decoded.cache_hit, "reads are marked as cache hits");

    // Modulo the hit flag, the decoded response is the original.
    let mut cleared = decoded.clone();
    cleared.cache_hit = false;
    assert_eq!(cleared, response);

    // Re-encoding reproduces the stored bytes exactly.
    assert_eq!(encode_response(&decoded).unwrap(), bytes);
}

#[test]
fn cached_writes_always_clear_the_hit_flag() {
    let mut response = RouteResponse {
        request_id: "id".into(),
        calculated_at: Utc::now(),
        calculation_duration_ms: 1,
        primary_route: None,
        alternative_routes: Vec::new(),
        algorithm: "dijkstra".into(),
        criterion: OptimizationCriteria::Fastest,
        routes_evaluated: 1,
        cache_hit: true,
        diagnostics: Vec::new(),
    };
    response.cache_hit = true;
    let bytes = encode_response(&response).unwrap();
    let stored: RouteResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(!stored.cache_hit);
}
