//! Fire-and-forget analytics sink.
//!
//! The coordinator emits one event per completed calculation. Sinks must
//! never block the request path or surface errors; the bundled
//! implementation logs through `tracing`.

use serde::Serialize;

/// Outcome tag for a calculation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationOutcome {
    Success,
    NoRoute,
    Failed,
}

/// One completed route calculation.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationEvent {
    pub request_id: String,
    pub fingerprint: String,
    pub duration_ms: u64,
    pub cache_hit: bool,
    pub routes_evaluated: usize,
    pub alternatives_returned: usize,
    pub outcome: CalculationOutcome,
}

/// Analytics seam. `record` is fire-and-forget: implementations swallow their
/// own failures.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: CalculationEvent);
}

/// Sink that logs events as structured tracing records.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn record(&self, event: CalculationEvent) {
        tracing::info!(
            request_id = %event.request_id,
            fingerprint = %event.fingerprint,
            duration_ms = event.duration_ms,
            cache_hit = event.cache_hit,
            routes_evaluated = event.routes_evaluated,
            alternatives = event.alternatives_returned,
            outcome = ?event.outcome,
            "route calculation completed"
        );
    }
}

/// Sink that drops everything; default for tests.
#[derive(Debug, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn record(&self, _event: CalculationEvent) {}
}

/// Counting sink for instrumented tests.
#[derive(Debug, Default)]
pub struct CountingSink {
    events: std::sync::Mutex<Vec<CalculationEvent>>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CalculationEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }
}

impl AnalyticsSink for CountingSink {
    fn record(&self, event: CalculationEvent) {
        self.events.lock().expect("sink lock poisoned").push(event);
    }
}
