//! Error types for the coordinator and its collaborators
//!
//! Each boundary gets its own thiserror enum; `ResolveError` is the only one
//! callers of the coordinator ever see.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error ==
/// Failure reported by a cache backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// Key or value rejected by backend limits
    #[error("Invalid cache request: {0}")]
    InvalidRequest(String),

    /// Backend is full and could not make room
    #[error("Cache capacity exhausted: {0}")]
    CapacityExhausted(String),
}

// == Dispatch Error ==
/// Failure reported by a dispatcher when enqueueing a job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A job with this id is already active
    #[error("Job already active: {0}")]
    DuplicateId(String),

    /// Too many jobs in flight
    #[error("Dispatcher at capacity ({0} active jobs)")]
    CapacityExhausted(usize),

    /// Dispatcher no longer accepts work
    #[error("Dispatcher is closed")]
    Closed,
}

// == Job Error ==
/// Terminal failure of a job, shared by every waiter of that job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("No handler registered for computation type '{0}'")]
    UnregisteredHandler(String),

    #[error("Computation failed: {0}")]
    Failed(String),

    #[error("Computation panicked: {0}")]
    Panicked(String),

    /// The job was dropped before it published an outcome
    #[error("Job abandoned before completion")]
    Abandoned,
}

// == Wait Error ==
/// Outcome of waiting on a job handle that did not produce a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Job(#[from] JobError),
}

// == Resolve Error ==
/// Caller-visible failure of `resolve` / `warm_refresh`.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unregistered computation type: {0}")]
    UnregisteredHandler(String),

    #[error("Failed to schedule computation for '{key}': {source}")]
    Dispatch {
        key: String,
        #[source]
        source: DispatchError,
    },

    #[error("Computation timed out for '{key}' after {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    #[error("Computation failed for '{key}': {source}")]
    Computation {
        key: String,
        #[source]
        source: JobError,
    },

    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ResolveError {
    /// Maps a failed wait on `key` into the caller-visible taxonomy.
    pub fn from_wait(key: &str, err: WaitError) -> Self {
        match err {
            WaitError::Timeout(timeout) => ResolveError::Timeout {
                key: key.to_string(),
                timeout,
            },
            WaitError::Job(JobError::UnregisteredHandler(kind)) => {
                ResolveError::UnregisteredHandler(kind)
            }
            WaitError::Job(source) => ResolveError::Computation {
                key: key.to_string(),
                source,
            },
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let status = match &self {
            ResolveError::UnregisteredHandler(_) => StatusCode::NOT_FOUND,
            ResolveError::Dispatch { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ResolveError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ResolveError::Computation { .. } => StatusCode::BAD_GATEWAY,
            ResolveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ResolveError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_wait_maps_to_unregistered() {
        let err = ResolveError::from_wait(
            "user:1",
            WaitError::Job(JobError::UnregisteredHandler("fetchUser".to_string())),
        );
        assert!(matches!(err, ResolveError::UnregisteredHandler(kind) if kind == "fetchUser"));
    }

    #[test]
    fn test_timeout_wait_keeps_key() {
        let err = ResolveError::from_wait("k", WaitError::Timeout(Duration::from_millis(10)));
        match err {
            ResolveError::Timeout { key, timeout } => {
                assert_eq!(key, "k");
                assert_eq!(timeout, Duration::from_millis(10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failure_wait_maps_to_computation() {
        let err = ResolveError::from_wait("k", WaitError::Job(JobError::Failed("boom".into())));
        assert!(matches!(err, ResolveError::Computation { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ResolveError::UnregisteredHandler("x".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ResolveError::Dispatch {
                    key: "k".into(),
                    source: DispatchError::Closed,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ResolveError::Timeout {
                    key: "k".into(),
                    timeout: Duration::from_millis(1),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ResolveError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
