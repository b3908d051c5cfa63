//! Request coordinator.
//!
//! Orchestrates validate → cache lookup → single-flight compute → cache store
//! → respond under a single deadline. The coordinator owns its collaborators
//! by explicit composition (repository, snapshot store, cost model, cache,
//! analytics sink); there is no ambient state.
//!
//! Concurrency contract: one computation per fingerprint at a time (the
//! in-flight registry collapses concurrent identical requests), a global
//! semaphore bounds simultaneous compute executions, and the in-flight entry
//! is always removed before a call returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, warn};

use crate::analytics::{AnalyticsSink, CalculationEvent, CalculationOutcome};
use crate::assemble::{assemble_route, DetailedRoute};
use crate::cache::{decode_response, encode_response, route_key, RouteCache};
use crate::catalog::SnapshotStore;
use crate::config::PlannerConfig;
use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::path::{CancelToken, Pathfinder, SearchParams};
use crate::repo::PortRepository;
use crate::request::{RouteRequest, ValidationResult};

/// Response to a route calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub request_id: String,
    pub calculated_at: DateTime<Utc>,
    pub calculation_duration_ms: u64,
    /// `None` means "no route": a valid answer, not an error.
    pub primary_route: Option<DetailedRoute>,
    pub alternative_routes: Vec<DetailedRoute>,
    pub algorithm: String,
    pub criterion: crate::port::OptimizationCriteria,
    pub routes_evaluated: usize,
    pub cache_hit: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Counters exposed for tests and the health surface.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CoordinatorStats {
    pub pathfinder_executions: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub singleflight_joins: u64,
}

#[derive(Default)]
struct StatCounters {
    pathfinder_executions: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    singleflight_joins: AtomicU64,
}

type InFlightOutcome = std::result::Result<Arc<RouteResponse>, Error>;
type InFlightReceiver = watch::Receiver<Option<InFlightOutcome>>;

/// Outcome of checking/registering the in-flight registry for a key.
enum SingleFlightSlot {
    /// Another computation for this key is already running; attach to it.
    Attach(InFlightReceiver),
    /// No computation is running; this caller is now the leader.
    Lead(watch::Sender<Option<InFlightOutcome>>),
}

/// The request coordinator.
pub struct RouteCoordinator {
    snapshots: Arc<SnapshotStore>,
    repository: Arc<dyn PortRepository>,
    cache: Arc<dyn RouteCache>,
    sink: Arc<dyn AnalyticsSink>,
    cost_model: CostModel,
    config: PlannerConfig,
    inflight: Mutex<HashMap<String, InFlightReceiver>>,
    semaphore: Arc<Semaphore>,
    stats: StatCounters,
}

impl RouteCoordinator {
    pub fn new(
        snapshots: Arc<SnapshotStore>,
        repository: Arc<dyn PortRepository>,
        cache: Arc<dyn RouteCache>,
        sink: Arc<dyn AnalyticsSink>,
        cost_model: CostModel,
        config: PlannerConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_calculations));
        Self {
            snapshots,
            repository,
            cache,
            sink,
            cost_model,
            config,
            inflight: Mutex::new(HashMap::new()),
            semaphore,
            stats: StatCounters::default(),
        }
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            pathfinder_executions: self.stats.pathfinder_executions.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.stats.cache_misses.load(Ordering::Relaxed),
            singleflight_joins: self.stats.singleflight_joins.load(Ordering::Relaxed),
        }
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    /// Run validation only (request shape plus port resolution).
    pub fn validate(&self, request: &RouteRequest) -> ValidationResult {
        match self.validate_inner(request) {
            Ok(()) => ValidationResult::ok(),
            Err(err) => ValidationResult::failed(vec![err.to_string()]),
        }
    }

    fn validate_inner(&self, request: &RouteRequest) -> Result<()> {
        request.validate()?;
        for code in [&request.origin, &request.destination] {
            let port = self.repository.get(code)?;
            if !port.status.accepts_traffic() {
                return Err(Error::PortNotFound { code: code.clone() });
            }
        }
        Ok(())
    }

    /// Calculate a route under the request deadline.
    pub async fn calculate(&self, request: RouteRequest) -> Result<RouteResponse> {
        let started = Instant::now();
        let budget = request
            .timeout_s
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_request_timeout)
            .min(self.config.default_request_timeout);
        let deadline = started + budget;

        // A zero budget fails before any side effect.
        if budget.is_zero() {
            return Err(Error::DeadlineExceeded);
        }

        // Step 1: validate, including port resolution.
        self.validate_inner(&request)?;

        // Step 2: fingerprint and cache fast path.
        let fp = fingerprint(&request);
        let key = route_key(&fp);
        if let Some(hit) = self.cache_lookup(&key) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            self.emit(&hit, &fp, started, CalculationOutcome::Success);
            return Ok(hit);
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        // Step 3: single-flight. Either attach to the running computation for
        // this fingerprint or register as its leader.
        let tx = match self.singleflight_slot(&key) {
            SingleFlightSlot::Attach(rx) => {
                self.stats.singleflight_joins.fetch_add(1, Ordering::Relaxed);
                return self.await_leader(rx, deadline).await;
            }
            SingleFlightSlot::Lead(tx) => tx,
        };

        // The entry must come out of the registry on every path from here,
        // including panics.
        let _guard = InFlightGuard {
            inflight: &self.inflight,
            key: &key,
        };

        // Step 4-5: bounded compute, store, publish.
        let result = self.compute_guarded(&request, &fp, started, deadline).await;
        match &result {
            Ok(response) => {
                let _ = tx.send(Some(Ok(Arc::new(response.clone()))));
            }
            Err(err) => {
                let _ = tx.send(Some(Err(err.clone())));
            }
        }
        result
    }

    /// Attach to an already-running computation for `key`, or register as
    /// its leader. Kept as a plain (non-async) method so the registry's
    /// `MutexGuard` never has to live across an `.await` point.
    fn singleflight_slot(&self, key: &str) -> SingleFlightSlot {
        let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
        if let Some(rx) = inflight.get(key) {
            return SingleFlightSlot::Attach(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        inflight.insert(key.to_string(), rx);
        SingleFlightSlot::Lead(tx)
    }

    async fn await_leader(
        &self,
        mut rx: InFlightReceiver,
        deadline: Instant,
    ) -> Result<RouteResponse> {
        let wait = async {
            loop {
                if let Some(outcome) = rx.borrow().clone() {
                    return outcome;
                }
                if rx.changed().await.is_err() {
                    // Leader dropped without publishing; the registry entry is
                    // gone, so a retry may re-attempt.
                    return Err(Error::Cancelled);
                }
            }
        };
        match tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), wait).await {
            Ok(Ok(response)) => Ok((*response).clone()),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(Error::DeadlineExceeded),
        }
    }

    async fn compute_guarded(
        &self,
        request: &RouteRequest,
        fp: &Fingerprint,
        started: Instant,
        deadline: Instant,
    ) -> Result<RouteResponse> {
        // Step 6: concurrency ceiling with a bounded wait for a slot.
        let permit = match tokio::time::timeout(
            self.config.overload_wait,
            self.semaphore.clone().acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            _ => return Err(Error::Overloaded),
        };

        let result = self.compute(request, deadline);
        drop(permit);

        match result {
            Ok(response) => {
                // Step 5: cache successful routes only; failures degrade.
                if response.primary_route.is_some() {
                    self.cache_store(&route_key(fp), &response);
                }
                let outcome = if response.primary_route.is_some() {
                    CalculationOutcome::Success
                } else {
                    CalculationOutcome::NoRoute
                };
                self.emit(&response, fp, started, outcome);
                Ok(response)
            }
            Err(err) => {
                self.emit_failure(fp, started, &err);
                Err(err)
            }
        }
    }

    /// The compute phase proper: snapshot, pathfind, assemble.
    fn compute(&self, request: &RouteRequest, deadline: Instant) -> Result<RouteResponse> {
        let started = Instant::now();
        let snapshot = self.snapshots.snapshot();
        let graph = &snapshot.graph;
        let catalog = &snapshot.catalog;

        let origin = graph
            .node_id(&request.origin)
            .ok_or_else(|| Error::PortNotFound {
                code: request.origin.clone(),
            })?;
        let destination = graph
            .node_id(&request.destination)
            .ok_or_else(|| Error::PortNotFound {
                code: request.destination.clone(),
            })?;

        self.stats.pathfinder_executions.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelToken::with_deadline(deadline);
        let params = SearchParams {
            criterion: request.criterion,
            max_intermediates: request.max_connecting_ports,
            max_paths: 1 + request.max_alternative_routes,
            alt_cost_ratio: self.config.pathfinder_alt_cost_ratio,
            cancel_check_interval: self.config.pathfinder_cancel_check_interval,
        };
        let finder = Pathfinder::new(
            graph,
            catalog,
            &self.cost_model,
            &request.vessel,
            params,
            &cancel,
        );
        let outcome = finder.find_routes(origin, destination)?;

        let request_id = uuid::Uuid::new_v4().to_string();
        let mut response = RouteResponse {
            request_id,
            calculated_at: Utc::now(),
            calculation_duration_ms: 0,
            primary_route: None,
            alternative_routes: Vec::new(),
            algorithm: outcome.algorithm.to_string(),
            criterion: request.criterion,
            routes_evaluated: outcome.candidates_evaluated,
            cache_hit: false,
            diagnostics: Vec::new(),
        };

        if outcome.paths.is_empty() {
            response.diagnostics = self.no_route_diagnostics(request, &snapshot);
        } else {
            let mut routes = outcome.paths.iter().map(|path| {
                assemble_route(
                    path,
                    graph,
                    catalog,
                    &self.cost_model,
                    &request.vessel,
                    request.criterion,
                    request.departure_time,
                )
            });
            response.primary_route = routes.next();
            response.alternative_routes = routes.collect();
        }

        response.calculation_duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            routes = outcome.paths.len(),
            evaluated = outcome.candidates_evaluated,
            algorithm = outcome.algorithm,
            "compute phase finished"
        );
        Ok(response)
    }

    /// Explain why the feasible subgraph disconnected the pair.
    fn no_route_diagnostics(
        &self,
        request: &RouteRequest,
        snapshot: &crate::catalog::Snapshot,
    ) -> Vec<String> {
        let vessel = &request.vessel;
        let mut notes = Vec::new();
        for code in [&request.origin, &request.destination] {
            if let Some(port) = snapshot.catalog.get(code) {
                if !port.accommodates(vessel.length_m, vessel.beam_m, vessel.draft_m) {
                    notes.push(format!(
                        "port {code} cannot accommodate vessel dimensions \
                         {:.0}x{:.0}x{:.1} m",
                        vessel.length_m, vessel.beam_m, vessel.draft_m
                    ));
                }
            }
        }
        if !vessel.suez_canal_compatible || !vessel.panama_canal_compatible {
            notes.push("canal restrictions limited the candidate legs".to_string());
        }
        if notes.is_empty() {
            notes.push(format!(
                "no feasible path within {} connecting ports",
                request.max_connecting_ports
            ));
        }
        notes
    }

    fn cache_lookup(&self, key: &str) -> Option<RouteResponse> {
        match self.cache.get(key) {
            Ok(Some(bytes)) => match decode_response(&bytes) {
                Ok(response) => Some(response),
                Err(err) => {
                    warn!(error = %err, "cache entry undecodable, treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                // Cache failures degrade to a miss.
                warn!(error = %err, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn cache_store(&self, key: &str, response: &RouteResponse) {
        let payload = match encode_response(response) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "response not cacheable");
                return;
            }
        };
        if let Err(err) = self.cache.put(key, payload, self.config.route_cache_ttl) {
            warn!(error = %err, "cache store failed, continuing");
        }
    }

    fn emit(
        &self,
        response: &RouteResponse,
        fp: &Fingerprint,
        started: Instant,
        outcome: CalculationOutcome,
    ) {
        self.sink.record(CalculationEvent {
            request_id: response.request_id.clone(),
            fingerprint: fp.as_hex().to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            cache_hit: response.cache_hit,
            routes_evaluated: response.routes_evaluated,
            alternatives_returned: response.alternative_routes.len(),
            outcome,
        });
    }

    fn emit_failure(&self, fp: &Fingerprint, started: Instant, err: &Error) {
        self.sink.record(CalculationEvent {
            request_id: String::new(),
            fingerprint: fp.as_hex().to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            cache_hit: false,
            routes_evaluated: 0,
            alternatives_returned: 0,
            outcome: CalculationOutcome::Failed,
        });
        debug!(error = %err, "route calculation failed");
    }
}

/// Removes the in-flight registry entry when the leader finishes, fails, or
/// panics, so a later arrival can re-attempt.
struct InFlightGuard<'a> {
    inflight: &'a Mutex<HashMap<String, InFlightReceiver>>,
    key: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut inflight) = self.inflight.lock() {
            inflight.remove(self.key);
        }
    }
}
