use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the fairway library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Variants carry plain data (no wrapped source errors) so the whole enum is
/// `Clone`; the coordinator's single-flight registry hands the same outcome to
/// every attached waiter.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Request input was malformed or out of range. Never retried.
    #[error("invalid request: {message}")]
    Validation { message: String },

    /// A port code could not be resolved, or the port is not operational.
    #[error("port {code} not found or not operational")]
    PortNotFound { code: String },

    /// The feasible subgraph disconnects origin from destination.
    ///
    /// This is a valid answer at the API surface (200 with a null primary
    /// route); it is an error only inside the compute pipeline.
    #[error("no route found between {origin} and {destination}")]
    NoRoute {
        origin: String,
        destination: String,
        diagnostics: Vec<String>,
    },

    /// The request deadline elapsed before the computation finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The search was cancelled through its cancellation token.
    #[error("route computation cancelled")]
    Cancelled,

    /// The compute semaphore could not be obtained within the wait budget.
    #[error("service overloaded, retry with backoff")]
    Overloaded,

    /// The catalog produced a disconnected or inconsistent graph.
    ///
    /// Fatal at startup. At runtime the previous good snapshot stays in use.
    #[error("graph build failed: {reason}")]
    GraphBuildFailed { reason: String },

    /// A repository or cache backend call failed.
    #[error("backend {backend} unavailable: {message}")]
    BackendUnavailable { backend: String, message: String },

    /// A data file (catalog, cost tables, zone map) could not be loaded.
    #[error("failed to load data file {path}: {message}")]
    DataFile { path: PathBuf, message: String },

    /// Serialization or deserialization failure.
    #[error("serialization failed: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Short machine-readable kind tag, used by the error envelope and
    /// analytics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::PortNotFound { .. } => "PORT_NOT_FOUND",
            Error::NoRoute { .. } => "NO_ROUTE_FOUND",
            Error::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Error::Cancelled => "CANCELLED",
            Error::Overloaded => "OVERLOADED",
            Error::GraphBuildFailed { .. } => "GRAPH_BUILD_FAILED",
            Error::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            Error::DataFile { .. } => "DATA_FILE",
            Error::Serialization { .. } => "SERIALIZATION",
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}
