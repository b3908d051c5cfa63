//! Error envelope for the HTTP surface.
//!
//! Every error response has the shape
//! `{ "error": "<KIND>", "message": "...", "details": { ... }, "request_id": "..." }`.
//! "No route found" is deliberately not an envelope: it is a valid 200
//! answer with a null primary route.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use fairway_lib::Error as LibError;

/// The wire shape of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Machine-readable kind tag, e.g. `VALIDATION_ERROR`.
    pub error: String,
    /// Human-readable explanation.
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
    pub request_id: String,
    #[serde(skip)]
    status: u16,
}

impl ErrorEnvelope {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            error: kind.into(),
            message: message.into(),
            details: Value::Null,
            request_id: request_id.into(),
            status: status.as_u16(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// 400 envelope for malformed input.
    pub fn bad_request(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            "VALIDATION_ERROR",
            message,
            StatusCode::BAD_REQUEST,
            request_id,
        )
    }

    /// Map a library error onto its envelope and status code.
    pub fn from_error(error: &LibError, request_id: &str) -> Self {
        let status = match error {
            LibError::Validation { .. } => StatusCode::BAD_REQUEST,
            LibError::PortNotFound { .. } => StatusCode::NOT_FOUND,
            LibError::DeadlineExceeded | LibError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            LibError::Overloaded => StatusCode::TOO_MANY_REQUESTS,
            LibError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match error {
            LibError::PortNotFound { code } => json!({ "code": code }),
            LibError::BackendUnavailable { backend, .. } => json!({ "backend": backend }),
            LibError::NoRoute { diagnostics, .. } => json!({ "diagnostics": diagnostics }),
            _ => Value::Null,
        };

        Self::new(error.kind(), error.to_string(), status, request_id).with_details(details)
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_the_contract() {
        let cases = [
            (
                LibError::Validation {
                    message: "bad".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LibError::PortNotFound {
                    code: "ZZZZZ".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (LibError::DeadlineExceeded, StatusCode::REQUEST_TIMEOUT),
            (LibError::Overloaded, StatusCode::TOO_MANY_REQUESTS),
            (
                LibError::BackendUnavailable {
                    backend: "repository".into(),
                    message: "down".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LibError::GraphBuildFailed {
                    reason: "disconnected".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ErrorEnvelope::from_error(&error, "req-1").status(), status);
        }
    }

    #[test]
    fn envelope_serialization_shape() {
        let envelope = ErrorEnvelope::from_error(
            &LibError::PortNotFound {
                code: "ZZZZZ".into(),
            },
            "req-42",
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["error"], "PORT_NOT_FOUND");
        assert_eq!(value["request_id"], "req-42");
        assert_eq!(value["details"]["code"], "ZZZZZ");
        assert!(value.get("status").is_none(), "status is not on the wire");
    }

    #[test]
    fn null_details_are_omitted() {
        let envelope = ErrorEnvelope::bad_request("nope", "req-7");
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("details"));
    }
}
