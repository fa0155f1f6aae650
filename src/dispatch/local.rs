//! In-process dispatcher
//!
//! Jobs run on spawned tokio tasks through a [`Worker`]. A single mutex over
//! the active-job map makes create-or-reject atomic per job id; a semaphore
//! bounds how many handlers execute at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, info};

use crate::config::Config;
use crate::dispatch::{Dispatcher, JobCompleter, JobHandle, JobPayload};
use crate::error::{DispatchError, JobError};
use crate::worker::Worker;

#[derive(Debug, Clone)]
pub struct LocalDispatcher {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    jobs: Mutex<HashMap<String, JobHandle>>,
    worker: Worker,
    permits: Semaphore,
    max_in_flight: usize,
    closed: AtomicBool,
    idle: Notify,
}

impl LocalDispatcher {
    /// Creates a dispatcher allowing `max_in_flight` active jobs, of which at
    /// most `concurrency` execute at the same time.
    pub fn new(worker: Worker, max_in_flight: usize, concurrency: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(HashMap::new()),
                worker,
                permits: Semaphore::new(concurrency.max(1)),
                max_in_flight,
                closed: AtomicBool::new(false),
                idle: Notify::new(),
            }),
        }
    }

    pub fn from_config(worker: Worker, config: &Config) -> Self {
        Self::new(worker, config.max_in_flight, config.worker_concurrency)
    }

    /// Number of jobs enqueued and not yet finished.
    pub fn active_jobs(&self) -> usize {
        self.inner.jobs().len()
    }

    /// Stops accepting new jobs. Jobs already enqueued still run to completion.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        info!(active = self.active_jobs(), "Dispatcher closed to new jobs");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Waits up to `timeout` for every active job to finish. Returns false if
    /// jobs were still running when the bound elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let drained = async {
            loop {
                // Registered before the check so a retirement in between is not missed.
                let idle = self.inner.idle.notified();
                if self.active_jobs() == 0 {
                    return;
                }
                idle.await;
            }
        };

        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

impl Inner {
    fn jobs(&self) -> MutexGuard<'_, HashMap<String, JobHandle>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(self: Arc<Self>, job_id: String, payload: JobPayload, completer: JobCompleter) {
        let outcome = match self.permits.acquire().await {
            Ok(_permit) => self.worker.execute(&payload).await,
            Err(_) => Err(JobError::Abandoned),
        };

        // Publish before removal so a lookup racing with completion still
        // finds a handle that resolves immediately.
        completer.complete(outcome);
        let remaining = {
            let mut jobs = self.jobs();
            jobs.remove(&job_id);
            jobs.len()
        };
        debug!(%job_id, remaining, "Job retired");

        if remaining == 0 {
            self.idle.notify_waiters();
        }
    }
}

#[async_trait]
impl Dispatcher for LocalDispatcher {
    async fn enqueue(&self, job_id: &str, payload: JobPayload) -> Result<JobHandle, DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::Closed);
        }

        let (completer, handle) = {
            let mut jobs = self.inner.jobs();
            if jobs.contains_key(job_id) {
                return Err(DispatchError::DuplicateId(job_id.to_string()));
            }
            if jobs.len() >= self.inner.max_in_flight {
                return Err(DispatchError::CapacityExhausted(jobs.len()));
            }

            let (completer, handle) = JobHandle::channel(job_id);
            jobs.insert(job_id.to_string(), handle.clone());
            (completer, handle)
        };

        debug!(
            %job_id,
            computation_type = %payload.computation_type,
            "Job enqueued"
        );
        tokio::spawn(self.inner.clone().run(job_id.to_string(), payload, completer));

        Ok(handle)
    }

    async fn lookup(&self, job_id: &str) -> Option<JobHandle> {
        self.inner.jobs().get(job_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HandlerRegistry;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn payload(computation_type: &str) -> JobPayload {
        JobPayload {
            cache_key: "job".to_string(),
            computation_type: computation_type.to_string(),
            params: Value::Null,
        }
    }

    /// Dispatcher whose "gate" handler blocks until the returned Notify fires.
    fn gated_dispatcher(max_in_flight: usize) -> (LocalDispatcher, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let registry = HandlerRegistry::new();
        let release = gate.clone();
        registry.register("gate", move |_| {
            let release = release.clone();
            async move {
                release.notified().await;
                Ok(json!("released"))
            }
        });
        let worker = Worker::new(Arc::new(registry));
        (LocalDispatcher::new(worker, max_in_flight, 4), gate)
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_while_active() {
        let (dispatcher, gate) = gated_dispatcher(8);

        let handle = dispatcher.enqueue("job", payload("gate")).await.unwrap();
        let second = dispatcher.enqueue("job", payload("gate")).await;
        assert_eq!(second.unwrap_err(), DispatchError::DuplicateId("job".into()));

        assert!(dispatcher.lookup("job").await.is_some());
        assert_eq!(dispatcher.active_jobs(), 1);

        gate.notify_one();
        assert_eq!(
            handle.await_completion(Duration::from_secs(1)).await,
            Ok(json!("released"))
        );
    }

    #[tokio::test]
    async fn test_job_retired_after_completion() {
        let (dispatcher, gate) = gated_dispatcher(8);

        let handle = dispatcher.enqueue("job", payload("gate")).await.unwrap();
        gate.notify_one();
        handle.wait().await.unwrap();

        // Removal follows publication; give the task a moment to finish.
        for _ in 0..50 {
            if dispatcher.active_jobs() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(dispatcher.lookup("job").await.is_none());
        assert!(dispatcher.enqueue("job", payload("gate")).await.is_ok());
        gate.notify_one();
    }

    #[tokio::test]
    async fn test_capacity_exhausted() {
        let (dispatcher, gate) = gated_dispatcher(1);

        dispatcher.enqueue("a", payload("gate")).await.unwrap();
        assert_eq!(
            dispatcher.enqueue("b", payload("gate")).await.unwrap_err(),
            DispatchError::CapacityExhausted(1)
        );
        gate.notify_one();
    }

    #[tokio::test]
    async fn test_drain_waits_for_active_jobs() {
        let (dispatcher, gate) = gated_dispatcher(8);
        let handle = dispatcher.enqueue("job", payload("gate")).await.unwrap();
        dispatcher.shutdown();

        assert!(!dispatcher.drain(Duration::from_millis(20)).await);
        assert_eq!(dispatcher.active_jobs(), 1);

        gate.notify_one();
        assert!(dispatcher.drain(Duration::from_secs(1)).await);
        assert_eq!(dispatcher.active_jobs(), 0);
        assert_eq!(handle.wait().await, Ok(json!("released")));
    }

    #[tokio::test]
    async fn test_drain_idle_dispatcher_returns_immediately() {
        let (dispatcher, _gate) = gated_dispatcher(8);
        assert!(dispatcher.drain(Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn test_closed_dispatcher_rejects() {
        let (dispatcher, _gate) = gated_dispatcher(8);
        dispatcher.shutdown();

        assert!(dispatcher.is_closed());
        assert_eq!(
            dispatcher.enqueue("job", payload("gate")).await.unwrap_err(),
            DispatchError::Closed
        );
    }

    #[tokio::test]
    async fn test_unregistered_type_fails_job() {
        let (dispatcher, _gate) = gated_dispatcher(8);

        let handle = dispatcher.enqueue("job", payload("missing")).await.unwrap();
        assert_eq!(
            handle.wait().await,
            Err(JobError::UnregisteredHandler("missing".into()))
        );
    }
}
