//! Dispatch Module
//!
//! The work-dispatch capability the coordinator consumes: enqueue a job under
//! a deterministic id and wait on its shared outcome.

mod handle;
mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

pub use handle::{JobCompleter, JobHandle, JobOutcome};
pub use local::LocalDispatcher;

/// What a job carries to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub cache_key: String,
    pub computation_type: String,
    pub params: Value,
}

/// Schedules jobs and exposes handles to the ones still active.
///
/// `enqueue` must be atomic per id: of any number of racing calls with the
/// same `job_id`, exactly one succeeds while that job is active and the rest
/// get [`DispatchError::DuplicateId`].
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn enqueue(&self, job_id: &str, payload: JobPayload) -> Result<JobHandle, DispatchError>;

    /// Handle to the active job with this id, if any.
    async fn lookup(&self, job_id: &str) -> Option<JobHandle>;
}
