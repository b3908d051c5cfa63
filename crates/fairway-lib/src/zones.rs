//! Static zone map: weather, piracy, political risk, and landmass barriers.
//!
//! The graph builder consults this map when materializing candidate legs.
//! Everything here is a configuration input with compiled-in defaults; a
//! deployment can override the tables from a JSON file.
//!
//! Landmass barriers are coarse polylines approximating continents. A
//! candidate leg whose plate-carrée segment crosses a barrier is discarded by
//! the builder (curated canal edges are exempt), which is what forces traffic
//! between basins through canals or around capes instead of straight across
//! a landmass.

use serde::{Deserialize, Serialize};

use crate::geo::Position;

/// A named latitude/longitude box with an associated scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneBox {
    pub name: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    /// Weather factor (>= 1.0) or risk score in [0, 100], per table.
    pub value: f64,
}

impl ZoneBox {
    fn contains(&self, p: Position) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lon..=self.max_lon).contains(&p.lon)
    }
}

/// Per-country political risk score in [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRisk {
    pub country: String,
    pub score: f64,
}

/// A landmass barrier polyline, vertices as (lat, lon).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrier {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// The full static zone map consumed by the graph builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneMap {
    pub weather: Vec<ZoneBox>,
    pub piracy: Vec<ZoneBox>,
    pub political: Vec<CountryRisk>,
    pub barriers: Vec<Barrier>,
}

impl Default for ZoneMap {
    fn default() -> Self {
        Self {
            weather: vec![
                zone("north_atlantic_winter", 42.0, 65.0, -60.0, -5.0, 1.25),
                zone("south_china_sea_typhoon", 5.0, 25.0, 105.0, 125.0, 1.15),
                zone("bay_of_biscay", 43.5, 48.5, -10.0, -1.0, 1.15),
                zone("southern_ocean", -65.0, -40.0, -180.0, 180.0, 1.35),
                zone("arabian_sea_monsoon", 5.0, 20.0, 55.0, 75.0, 1.1),
            ],
            piracy: vec![
                zone("gulf_of_aden", 8.0, 17.0, 42.0, 54.0, 55.0),
                zone("gulf_of_guinea", -2.0, 7.0, -8.0, 9.0, 60.0),
                zone("strait_of_malacca", -2.0, 7.0, 95.0, 105.0, 35.0),
                zone("sulu_sea", 4.0, 10.0, 118.0, 123.0, 40.0),
            ],
            political: vec![
                risk("YE", 80.0),
                risk("SO", 85.0),
                risk("LY", 75.0),
                risk("SY", 80.0),
                risk("VE", 55.0),
                risk("NG", 45.0),
                risk("ER", 50.0),
                risk("MM", 50.0),
            ],
            barriers: vec![
                barrier(
                    "africa",
                    &[(35.5, 9.8), (15.0, 17.0), (-10.0, 22.0), (-30.0, 25.0)],
                ),
                barrier("northeast_africa", &[(31.0, 31.5), (10.0, 38.0)]),
                barrier("sinai", &[(30.8, 32.7), (28.2, 33.8)]),
                barrier("arabia", &[(34.0, 36.0), (16.5, 52.5)]),
                barrier("india", &[(22.0, 77.0), (8.0, 77.5)]),
                barrier(
                    "mediterranean_north",
                    &[
                        (36.2, -5.3),
                        (38.5, 0.0),
                        (42.5, 3.0),
                        (44.0, 8.0),
                        (40.0, 18.0),
                        (40.5, 26.0),
                        (36.5, 36.0),
                    ],
                ),
                barrier(
                    "americas",
                    &[(50.0, -100.0), (17.0, -95.0), (9.3, -79.9), (-55.0, -70.0)],
                ),
            ],
        }
    }
}

fn zone(name: &str, min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64, value: f64) -> ZoneBox {
    ZoneBox {
        name: name.to_string(),
        min_lat,
        max_lat,
        min_lon,
        max_lon,
        value,
    }
}

fn risk(country: &str, score: f64) -> CountryRisk {
    CountryRisk {
        country: country.to_string(),
        score,
    }
}

fn barrier(name: &str, points: &[(f64, f64)]) -> Barrier {
    Barrier {
        name: name.to_string(),
        points: points.to_vec(),
    }
}

impl ZoneMap {
    /// Weather transit factor at a position; 1.0 outside all zones.
    pub fn weather_factor(&self, p: Position) -> f64 {
        self.weather
            .iter()
            .filter(|z| z.contains(p))
            .map(|z| z.value)
            .fold(1.0, f64::max)
    }

    /// Piracy risk score at a position; 0 outside all zones.
    pub fn piracy_score(&self, p: Position) -> f64 {
        self.piracy
            .iter()
            .filter(|z| z.contains(p))
            .map(|z| z.value)
            .fold(0.0, f64::max)
    }

    /// Political risk for a leg between two countries: the worse of the two.
    pub fn political_score(&self, country_a: &str, country_b: &str) -> f64 {
        let lookup = |c: &str| {
            self.political
                .iter()
                .find(|r| r.country == c)
                .map_or(0.0, |r| r.score)
        };
        lookup(country_a).max(lookup(country_b))
    }

    /// Whether the straight plate-carrée segment between two positions
    /// crosses any landmass barrier. Returns the barrier name if so.
    pub fn crossed_barrier(&self, a: Position, b: Position) -> Option<&str> {
        for barrier in &self.barriers {
            for pair in barrier.points.windows(2) {
                if segments_intersect(a, b, pair[0], pair[1]) {
                    return Some(&barrier.name);
                }
            }
        }
        None
    }
}

/// Proper segment intersection in longitude/latitude space.
///
/// The leg is unwrapped so its longitude span never exceeds 180 degrees
/// (trans-Pacific legs cross the antimeridian); the barrier segment is then
/// tested at longitude shifts of -360, 0, and +360.
fn segments_intersect(a: Position, b: Position, q1: (f64, f64), q2: (f64, f64)) -> bool {
    let mut dlon = b.lon - a.lon;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let p1 = (a.lon, a.lat);
    let p2 = (a.lon + dlon, b.lat);

    for shift in [-360.0, 0.0, 360.0] {
        let b1 = (q1.1 + shift, q1.0);
        let b2 = (q2.1 + shift, q2.0);
        let d1 = cross(b1, b2, p1);
        let d2 = cross(b1, b2, p2);
        let d3 = cross(p1, p2, b1);
        let d4 = cross(p1, p2, b2);
        if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
            return true;
        }
    }
    false
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}
