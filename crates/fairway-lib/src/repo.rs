//! Port repository seam.
//!
//! The core never touches a database; it sees this narrow trait. The bundled
//! implementation answers from the in-process catalog snapshot and spatial
//! index. Out-of-process implementations must stay within the stated time
//! budgets (proximity <= 50 ms p99, text search <= 100 ms) and be safe for
//! concurrent use.

use serde::{Deserialize, Serialize};

use crate::catalog::SnapshotStore;
use crate::error::{Error, Result};
use crate::port::{Port, VesselType};
use crate::spatial::ProximityQuery;
use std::sync::Arc;

/// Minimum accepted text query length.
const MIN_QUERY_LEN: usize = 2;
/// Hard cap on search results.
const MAX_SEARCH_RESULTS: usize = 100;
/// Similarity floor for the fuzzy tier.
const MIN_SIMILARITY: f64 = 0.4;

/// How a search hit matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactCode,
    NamePrefix,
    NameSubstring,
    Similar,
}

/// One port search hit with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSearchHit {
    pub port: Port,
    /// Relevance in [0, 100], higher is better.
    pub relevance: f64,
    pub match_kind: MatchKind,
}

/// Options for text search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: usize,
    pub country: Option<String>,
    pub vessel_type_compatible: Option<VesselType>,
    pub include_inactive: bool,
}

/// Abstract store over the port catalog.
pub trait PortRepository: Send + Sync {
    /// Look up a port by exact UN/LOCODE.
    fn get(&self, code: &str) -> Result<Port>;

    /// Ranked text search over codes and names.
    fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<PortSearchHit>>;

    /// Ports within `radius_nm` of a position, ascending by distance.
    fn nearby(&self, lat: f64, lon: f64, radius_nm: f64, limit: usize)
        -> Result<Vec<(Port, f64)>>;
}

/// Repository backed by the in-process snapshot store.
pub struct InMemoryRepository {
    snapshots: Arc<SnapshotStore>,
}

impl InMemoryRepository {
    pub fn new(snapshots: Arc<SnapshotStore>) -> Self {
        Self { snapshots }
    }
}

impl PortRepository for InMemoryRepository {
    fn get(&self, code: &str) -> Result<Port> {
        let snapshot = self.snapshots.snapshot();
        snapshot
            .catalog
            .get(code)
            .cloned()
            .ok_or_else(|| Error::PortNotFound {
                code: code.to_string(),
            })
    }

    fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<PortSearchHit>> {
        let trimmed = query.trim();
        if trimmed.len() < MIN_QUERY_LEN {
            return Err(Error::validation(format!(
                "search query must be at least {MIN_QUERY_LEN} characters"
            )));
        }
        let needle = trimmed.to_uppercase();
        let needle_lower = trimmed.to_lowercase();

        let snapshot = self.snapshots.snapshot();
        let mut hits: Vec<PortSearchHit> = Vec::new();
        for port in snapshot.catalog.ports_sorted() {
            if !options.include_inactive && !port.status.accepts_traffic() {
                continue;
            }
            if let Some(country) = &options.country {
                if !port.country.eq_ignore_ascii_case(country) {
                    continue;
                }
            }
            if let Some(vessel_type) = options.vessel_type_compatible {
                if !type_compatible(port, vessel_type) {
                    continue;
                }
            }

            let name_lower = port.name.to_lowercase();
            let (match_kind, relevance) = if port.unlocode == needle {
                (MatchKind::ExactCode, 100.0)
            } else if name_lower.starts_with(&needle_lower) {
                (MatchKind::NamePrefix, 85.0)
            } else if name_lower.contains(&needle_lower) {
                (MatchKind::NameSubstring, 70.0)
            } else {
                let similarity = strsim::sorensen_dice(&needle_lower, &name_lower);
                if similarity < MIN_SIMILARITY {
                    continue;
                }
                (MatchKind::Similar, 50.0 * similarity)
            };

            hits.push(PortSearchHit {
                port: port.clone(),
                relevance,
                match_kind,
            });
        }

        // Rank: relevance desc, then berth count desc, then name asc.
        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.port.berths.cmp(&a.port.berths))
                .then_with(|| a.port.name.cmp(&b.port.name))
        });

        let limit = if options.limit == 0 {
            MAX_SEARCH_RESULTS
        } else {
            options.limit.min(MAX_SEARCH_RESULTS)
        };
        hits.truncate(limit);
        Ok(hits)
    }

    fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_nm: f64,
        limit: usize,
    ) -> Result<Vec<(Port, f64)>> {
        let position = crate::geo::Position::new(lat, lon);
        if !position.is_valid() {
            return Err(Error::validation("coordinates out of range"));
        }
        if !(radius_nm > 0.0) {
            return Err(Error::validation("radius must be positive"));
        }

        let snapshot = self.snapshots.snapshot();
        let query = ProximityQuery {
            k: limit.max(1),
            radius_nm: Some(radius_nm),
            active_only: true,
        };
        let hits = snapshot.index.nearest(position, &query, &snapshot.catalog);
        Ok(hits
            .into_iter()
            .filter_map(|(code, dist)| Some((snapshot.catalog.get(code)?.clone(), dist)))
            .collect())
    }
}

/// Rough port/vessel type compatibility used as a search filter.
fn type_compatible(port: &Port, vessel_type: VesselType) -> bool {
    use crate::port::PortType;
    match vessel_type {
        VesselType::Container => matches!(
            port.port_type,
            PortType::ContainerTerminal | PortType::Multipurpose
        ),
        VesselType::BulkCarrier => matches!(
            port.port_type,
            PortType::BulkTerminal | PortType::Multipurpose
        ),
        VesselType::Tanker | VesselType::GasCarrier => matches!(
            port.port_type,
            PortType::TankerTerminal | PortType::Multipurpose
        ),
        _ => true,
    }
}
