//! Cache adapter for route responses.
//!
//! The cache backend is external; the core sees a byte-oriented key/value
//! trait with TTLs. Implementations must honor TTL, tolerate missing values,
//! and stay within a ~50 ms per-call budget; failures degrade to cache-miss
//! at the coordinator. Values under the same key are deterministic, so
//! concurrent writers are safe.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::coordinator::RouteResponse;
use crate::error::Result;
use crate::fingerprint::Fingerprint;

/// TTL for positive route responses (configurable via `PlannerConfig`).
pub const ROUTE_TTL: Duration = Duration::from_secs(30 * 60);
/// TTL for port lookups.
pub const PORT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// TTL for validation results.
pub const VALIDATION_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache key for a route response.
pub fn route_key(fingerprint: &Fingerprint) -> String {
    format!("routes:v1:{}", fingerprint.as_hex())
}

/// Key/value cache contract.
pub trait RouteCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

/// Serialize a response for caching; the stored copy always has `cache_hit`
/// cleared so a later read can set it truthfully.
pub fn encode_response(response: &RouteResponse) -> Result<Vec<u8>> {
    let mut stored = response.clone();
    stored.cache_hit = false;
    Ok(serde_json::to_vec(&stored)?)
}

/// Deserialize a cached response, marking it as a cache hit.
pub fn decode_response(bytes: &[u8]) -> Result<RouteResponse> {
    let mut response: RouteResponse = serde_json::from_slice(bytes)?;
    response.cache_hit = true;
    Ok(response)
}

/// In-process cache with TTL, for tests and single-node deployments.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Instant, Vec<u8>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .values()
            .filter(|(expiry, _)| *expiry > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RouteCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some((expiry, value)) if *expiry > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key.to_string(), (Instant::now() + ttl, value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::test_helpers::route_request;

    #[test]
    fn key_layout_is_versioned() {
        let fp = fingerprint(&route_request("SGSIN", "NLRTM"));
        let key = route_key(&fp);
        assert!(key.starts_with("routes:v1:"));
        assert_eq!(key.len(), "routes:v1:".len() + 64);
    }

    #[test]
    fn memory_cache_round_trips() {
        let cache = MemoryCache::new();
        cache
            .put("routes:v1:abc", b"payload".to_vec(), Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            cache.get("routes:v1:abc").unwrap().as_deref(),
            Some(b"payload".as_ref())
        );
        assert_eq!(cache.get("routes:v1:missing").unwrap(), None);
    }

    #[test]
    fn expired_entries_read_as_missing() {
        let cache = MemoryCache::new();
        cache
            .put("k", b"v".to_vec(), Duration::from_nanos(1))
            .unwrap();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get("k").unwrap(), None);
        assert!(cache.is_empty());
    }
}
