//! Job handles
//!
//! A job's outcome is published once through a watch channel; every clone of
//! the handle observes the same value, including clones taken after it landed.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

use crate::error::{JobError, WaitError};

pub type JobOutcome = Result<Value, JobError>;

/// Waiter side of a job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: Arc<str>,
    rx: watch::Receiver<Option<JobOutcome>>,
}

/// Producer side of a job. Dropping it unpublished abandons the job.
#[derive(Debug)]
pub struct JobCompleter {
    tx: watch::Sender<Option<JobOutcome>>,
}

impl JobHandle {
    /// Creates a linked completer/handle pair for `job_id`.
    pub fn channel(job_id: &str) -> (JobCompleter, JobHandle) {
        let (tx, rx) = watch::channel(None);
        (
            JobCompleter { tx },
            JobHandle {
                job_id: Arc::from(job_id),
                rx,
            },
        )
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Waits for the outcome without a bound.
    pub async fn wait(&self) -> JobOutcome {
        let mut rx = self.rx.clone();
        let published = rx
            .wait_for(Option::is_some)
            .await
            .map(|outcome| (*outcome).clone());

        match published {
            Ok(Some(outcome)) => outcome,
            _ => Err(JobError::Abandoned),
        }
    }

    /// Waits for the outcome for at most `timeout`.
    ///
    /// Giving up only ends this wait; the job itself keeps running.
    pub async fn await_completion(&self, timeout: Duration) -> Result<Value, WaitError> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(outcome) => outcome.map_err(WaitError::from),
            Err(_) => Err(WaitError::Timeout(timeout)),
        }
    }
}

impl JobCompleter {
    /// Publishes the outcome to every current and future waiter.
    pub fn complete(self, outcome: JobOutcome) {
        self.tx.send_replace(Some(outcome));
    }
}
