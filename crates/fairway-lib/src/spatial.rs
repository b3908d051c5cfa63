//! In-memory spatial index over port coordinates.
//!
//! A KD-tree (k=3) over on-sphere Cartesian coordinates backs proximity
//! queries; chord distances returned by the tree convert exactly to
//! great-circle arc distances. A hash table backs UN/LOCODE lookups. The
//! index is immutable once built; catalog changes produce a new index that is
//! swapped in atomically by the snapshot store.

use std::collections::HashMap;

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::info;

use crate::catalog::PortCatalog;
use crate::geo::{chord_to_arc_nm, Position};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Query parameters for proximity searches.
#[derive(Debug, Clone, Default)]
pub struct ProximityQuery {
    /// Maximum number of results.
    pub k: usize,
    /// Optional radius cap in nautical miles.
    pub radius_nm: Option<f64>,
    /// Skip ports that do not accept traffic.
    pub active_only: bool,
}

impl ProximityQuery {
    pub fn nearest(k: usize) -> Self {
        Self {
            k,
            radius_nm: None,
            active_only: false,
        }
    }

    pub fn within(k: usize, radius_nm: f64) -> Self {
        Self {
            k,
            radius_nm: Some(radius_nm),
            active_only: false,
        }
    }
}

/// Immutable spatial index over a port catalog.
pub struct SpatialIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    codes: Vec<String>,
    positions: Vec<Position>,
    code_to_slot: HashMap<String, usize>,
}

impl SpatialIndex {
    /// Bulk-load the index from a catalog. Every port is indexed; operational
    /// filtering happens at query time.
    pub fn build(catalog: &PortCatalog) -> Self {
        let mut codes = Vec::with_capacity(catalog.len());
        let mut positions = Vec::with_capacity(catalog.len());
        let mut code_to_slot = HashMap::with_capacity(catalog.len());
        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();

        // Sorted insertion keeps slot numbering deterministic across builds.
        for port in catalog.ports_sorted() {
            let slot = codes.len();
            tree.add(&port.position.to_cartesian(), slot);
            code_to_slot.insert(port.unlocode.clone(), slot);
            codes.push(port.unlocode.clone());
            positions.push(port.position);
        }

        info!(ports = codes.len(), "built spatial index");
        Self {
            tree,
            codes,
            positions,
            code_to_slot,
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Indexed position of a port, if present.
    pub fn position(&self, code: &str) -> Option<Position> {
        self.code_to_slot.get(code).map(|&i| self.positions[i])
    }

    /// Nearest ports to a position, optionally filtered.
    ///
    /// Results are `(code, distance_nm)` sorted by ascending distance. The
    /// query point itself is not excluded; callers filter self-matches.
    pub fn nearest<'a>(
        &'a self,
        origin: Position,
        query: &ProximityQuery,
        catalog: &PortCatalog,
    ) -> Vec<(&'a str, f64)> {
        if query.k == 0 || self.codes.is_empty() {
            return Vec::new();
        }

        let point = origin.to_cartesian();
        // Over-fetch to survive filtering, as long as the tree has entries.
        let fetch = query
            .k
            .saturating_mul(2)
            .saturating_add(8)
            .min(self.codes.len());
        let neighbours = self.tree.nearest_n::<SquaredEuclidean>(&point, fetch);

        let mut results = Vec::with_capacity(query.k);
        for n in neighbours {
            let code = self.codes[n.item].as_str();
            let distance = chord_to_arc_nm(n.distance.sqrt());
            if let Some(radius) = query.radius_nm {
                if distance > radius {
                    continue;
                }
            }
            if query.active_only && !port_active(catalog, code) {
                continue;
            }
            results.push((code, distance));
            if results.len() >= query.k {
                break;
            }
        }
        results
    }

    /// All ports within a radius of a position, sorted by ascending distance.
    pub fn within_radius<'a>(
        &'a self,
        origin: Position,
        radius_nm: f64,
        catalog: &PortCatalog,
        active_only: bool,
    ) -> Vec<(&'a str, f64)> {
        if radius_nm <= 0.0 || self.codes.is_empty() {
            return Vec::new();
        }

        let point = origin.to_cartesian();
        // Arc radius -> chord radius for the squared-Euclidean query.
        let chord = 2.0 * crate::geo::EARTH_RADIUS_NM
            * (radius_nm / (2.0 * crate::geo::EARTH_RADIUS_NM)).sin();
        let hits = self.tree.within::<SquaredEuclidean>(&point, chord * chord);

        let mut results: Vec<(&str, f64)> = hits
            .into_iter()
            .filter_map(|n| {
                let code = self.codes[n.item].as_str();
                if active_only && !port_active(catalog, code) {
                    return None;
                }
                Some((code, chord_to_arc_nm(n.distance.sqrt())))
            })
            .collect();
        results.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        results
    }
}

fn port_active(catalog: &PortCatalog, code: &str) -> bool {
    catalog
        .get(code)
        .map(|p| p.status.accepts_traffic())
        .unwrap_or(false)
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("ports", &self.codes.len())
            .finish()
    }
}
