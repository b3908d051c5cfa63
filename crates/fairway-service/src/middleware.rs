//! Request correlation and HTTP metrics middleware.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::http::{HeaderMap, Request, Response};
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Correlation id attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Time-sortable UUID v7.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Use the caller's `X-Request-ID` when present, otherwise mint one.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| RequestId(s.to_string()))
        .unwrap_or_else(RequestId::generate)
}

fn status_bucket(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Tower layer recording request counters and latency, and opening a tracing
/// span carrying the correlation id.
#[derive(Debug, Clone, Default)]
pub struct TelemetryLayer;

impl<S> Layer<S> for TelemetryLayer {
    type Service = TelemetryMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TelemetryMiddleware { inner }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TelemetryMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TelemetryFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let method = req.method().to_string();
        // Strip the query string so metric labels stay low-cardinality.
        let path = req
            .uri()
            .path()
            .split('?')
            .next()
            .unwrap_or("/")
            .to_string();
        let request_id = extract_or_generate_request_id(req.headers());
        let span = info_span!("request", request_id = %request_id, method = %method, path = %path);

        TelemetryFuture {
            inner: self.inner.call(req),
            start: Instant::now(),
            method,
            path,
            span,
        }
    }
}

pin_project! {
    pub struct TelemetryFuture<F> {
        #[pin]
        inner: F,
        start: Instant,
        method: String,
        path: String,
        span: Span,
    }
}

impl<F, ResBody, E> Future for TelemetryFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _enter = this.span.enter();

        let result = match this.inner.poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };

        let elapsed = this.start.elapsed().as_secs_f64();
        let status = match &result {
            Ok(response) => status_bucket(response.status().as_u16()),
            Err(_) => "5xx",
        };
        metrics::counter!(
            "fairway_http_requests_total",
            "method" => this.method.clone(),
            "path" => this.path.clone(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "fairway_http_request_duration_seconds",
            "method" => this.method.clone(),
            "path" => this.path.clone()
        )
        .record(elapsed);
        tracing::info!(status = status, latency_ms = elapsed * 1000.0, "request completed");

        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn request_id_prefers_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("req-abc"));
        assert_eq!(extract_or_generate_request_id(&headers).as_str(), "req-abc");
    }

    #[test]
    fn request_id_generated_when_missing_or_empty() {
        let generated = extract_or_generate_request_id(&HeaderMap::new());
        assert_eq!(generated.as_str().len(), 36);

        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static(""));
        assert_eq!(extract_or_generate_request_id(&headers).as_str().len(), 36);
    }

    #[test]
    fn status_buckets() {
        assert_eq!(status_bucket(200), "2xx");
        assert_eq!(status_bucket(404), "4xx");
        assert_eq!(status_bucket(503), "5xx");
        assert_eq!(status_bucket(101), "other");
    }
}
