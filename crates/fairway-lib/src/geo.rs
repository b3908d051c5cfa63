//! Great-circle geodesy on a spherical Earth.
//!
//! All distances are nautical miles on a sphere of radius
//! [`EARTH_RADIUS_NM`]. The functions are total: inputs inside the valid
//! latitude/longitude ranges always produce finite results, with trig
//! arguments clamped against rounding drift near antipodal points.

use serde::{Deserialize, Serialize};

/// Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// A geographic position in decimal degrees on WGS-84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in decimal degrees, [-90, 90].
    pub lat: f64,
    /// Longitude in decimal degrees, [-180, 180].
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when latitude and longitude are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Cartesian coordinates on the Earth sphere, in nautical miles.
    ///
    /// Chord distances between these points convert exactly back to arc
    /// distances, which is what the spatial index relies on.
    pub fn to_cartesian(&self) -> [f64; 3] {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        [
            EARTH_RADIUS_NM * lat.cos() * lon.cos(),
            EARTH_RADIUS_NM * lat.cos() * lon.sin(),
            EARTH_RADIUS_NM * lat.sin(),
        ]
    }
}

/// Great-circle distance between two positions in nautical miles (haversine).
pub fn distance_nm(a: Position, b: Position) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * h.sqrt().clamp(0.0, 1.0).asin()
}

/// Convert a chord length between two on-sphere Cartesian points back to the
/// great-circle arc length.
pub fn chord_to_arc_nm(chord: f64) -> f64 {
    let half = (chord / (2.0 * EARTH_RADIUS_NM)).clamp(-1.0, 1.0);
    2.0 * EARTH_RADIUS_NM * half.asin()
}

/// Initial compass bearing from `a` to `b` in degrees, [0, 360).
pub fn initial_bearing(a: Position, b: Position) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// `n + 1` points along the great circle from `a` to `b`, endpoints included.
///
/// Used for route visualization only. For coincident or antipodal endpoints
/// the interpolation degenerates to the endpoints themselves.
pub fn interpolate(a: Position, b: Position, n: usize) -> Vec<Position> {
    if n == 0 {
        return vec![a];
    }

    let lat1 = a.lat.to_radians();
    let lon1 = a.lon.to_radians();
    let lat2 = b.lat.to_radians();
    let lon2 = b.lon.to_radians();

    let delta = distance_nm(a, b) / EARTH_RADIUS_NM;
    let sin_delta = delta.sin();
    if sin_delta.abs() < 1e-12 {
        let mut points = vec![a; n];
        points.push(b);
        return points;
    }

    let mut points = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let f = i as f64 / n as f64;
        let p = ((1.0 - f) * delta).sin() / sin_delta;
        let q = (f * delta).sin() / sin_delta;

        let x = p * lat1.cos() * lon1.cos() + q * lat2.cos() * lon2.cos();
        let y = p * lat1.cos() * lon1.sin() + q * lat2.cos() * lon2.sin();
        let z = p * lat1.sin() + q * lat2.sin();

        points.push(Position {
            lat: z.atan2((x * x + y * y).sqrt()).to_degrees(),
            lon: y.atan2(x).to_degrees(),
        });
    }
    points
}

/// Great-circle midpoint of `a` and `b`.
pub fn midpoint(a: Position, b: Position) -> Position {
    interpolate(a, b, 2)[1]
}
