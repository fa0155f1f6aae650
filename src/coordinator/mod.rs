//! Cache-First Coordinator
//!
//! Answers a [`ComputationRequest`] from the cache when it can, and otherwise
//! makes sure exactly one job computes the value while every concurrent caller
//! for the same key waits on that job. Successful results are written back to
//! the cache on a best-effort basis.
//!
//! The coordinator holds no locks of its own. Single-flight rests entirely on
//! the dispatcher's atomic enqueue-by-id; the coordinator only reacts to an
//! enqueue being rejected by looking up the job that won.

mod stats;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cache::CacheBackend;
use crate::dispatch::{Dispatcher, JobHandle, JobPayload};
use crate::error::{DispatchError, ResolveError, Result, WaitError};

pub use stats::{ResolveStats, StatsSnapshot};

/// Default cache TTL for requests built without an explicit one.
pub const DEFAULT_CACHE_TTL: u64 = 300;

/// Default wait bound for requests built without an explicit one.
pub const DEFAULT_COMPUTATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Enqueue attempts before giving up when the conflicting job vanished
/// between the rejected enqueue and the follow-up lookup.
const SCHEDULE_ATTEMPTS: usize = 3;

/// One logical computation, identified by its cache key.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputationRequest {
    /// Cache key, also used as the job id
    pub cache_key: String,
    pub computation_type: String,
    pub params: Value,
    /// Cache TTL in seconds for the computed value
    pub cache_ttl: u64,
    /// How long this caller waits for the job
    pub timeout: Duration,
}

impl ComputationRequest {
    pub fn new(
        cache_key: impl Into<String>,
        computation_type: impl Into<String>,
        params: Value,
    ) -> Self {
        Self {
            cache_key: cache_key.into(),
            computation_type: computation_type.into(),
            params,
            cache_ttl: DEFAULT_CACHE_TTL,
            timeout: DEFAULT_COMPUTATION_TIMEOUT,
        }
    }

    /// Builds a request from typed params.
    pub fn typed<P: Serialize>(
        cache_key: impl Into<String>,
        computation_type: impl Into<String>,
        params: &P,
    ) -> Result<Self> {
        let params = serde_json::to_value(params)
            .map_err(|err| ResolveError::InvalidRequest(format!("unserializable params: {err}")))?;
        Ok(Self::new(cache_key, computation_type, params))
    }

    pub fn with_ttl(mut self, cache_ttl: u64) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_ms(self, timeout_ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(timeout_ms))
    }

    fn payload(&self) -> JobPayload {
        JobPayload {
            cache_key: self.cache_key.clone(),
            computation_type: self.computation_type.clone(),
            params: self.params.clone(),
        }
    }
}

// == Coordinator ==
#[derive(Clone)]
pub struct Coordinator {
    cache: Arc<dyn CacheBackend>,
    dispatcher: Arc<dyn Dispatcher>,
    stats: Arc<ResolveStats>,
    late_fill: bool,
}

impl Coordinator {
    pub fn new(cache: Arc<dyn CacheBackend>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            cache,
            dispatcher,
            stats: Arc::new(ResolveStats::new()),
            late_fill: true,
        }
    }

    /// Whether a caller that times out leaves behind a task that caches the
    /// job's result once it lands. Enabled by default.
    pub fn with_late_fill(mut self, enabled: bool) -> Self {
        self.late_fill = enabled;
        self
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the cached value for the request's key, or computes it through
    /// a single shared job and caches the result.
    #[instrument(
        skip_all,
        fields(cache_key = %request.cache_key, computation_type = %request.computation_type)
    )]
    pub async fn resolve(&self, request: &ComputationRequest) -> Result<Value> {
        if let Some(value) = self.read_cached(&request.cache_key).await {
            return Ok(value);
        }

        let handle = self.schedule(request).await?;

        let waited = handle.await_completion(request.timeout).await;
        let value = match waited {
            Ok(value) => value,
            Err(err) => {
                match &err {
                    WaitError::Timeout(timeout) => {
                        self.stats.record_timeout();
                        warn!(?timeout, "Gave up waiting for computation");
                        if self.late_fill {
                            self.spawn_late_fill(handle, request);
                        }
                    }
                    WaitError::Job(job_err) => {
                        self.stats.record_failure();
                        warn!("Computation did not produce a value: {}", job_err);
                    }
                }
                return Err(ResolveError::from_wait(&request.cache_key, err));
            }
        };

        self.write_cached(&request.cache_key, &value, request.cache_ttl)
            .await;
        Ok(value)
    }

    /// Drops any cached value for the key, then resolves.
    ///
    /// Still single-flight: if a job for the key is already running, this
    /// call joins it instead of starting another. A failed delete aborts the
    /// refresh.
    pub async fn warm_refresh(&self, request: &ComputationRequest) -> Result<Value> {
        self.cache.delete(&request.cache_key).await.map_err(|err| {
            warn!(cache_key = %request.cache_key, "Warm refresh could not clear entry: {}", err);
            ResolveError::from(err)
        })?;
        debug!(cache_key = %request.cache_key, "Cleared entry for warm refresh");
        self.resolve(request).await
    }

    /// [`resolve`](Self::resolve) with the result deserialized into `R`.
    pub async fn resolve_as<R: DeserializeOwned>(&self, request: &ComputationRequest) -> Result<R> {
        decode(self.resolve(request).await?)
    }

    /// [`warm_refresh`](Self::warm_refresh) with the result deserialized into `R`.
    pub async fn warm_refresh_as<R: DeserializeOwned>(
        &self,
        request: &ComputationRequest,
    ) -> Result<R> {
        decode(self.warm_refresh(request).await?)
    }

    async fn read_cached(&self, key: &str) -> Option<Value> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.stats.record_hit();
                    debug!("Cache hit");
                    Some(value)
                }
                Err(err) => {
                    self.stats.record_corrupt_entry();
                    self.stats.record_miss();
                    warn!("Ignoring undecodable cache entry: {}", err);
                    None
                }
            },
            Ok(None) => {
                self.stats.record_miss();
                debug!("Cache miss");
                None
            }
            Err(err) => {
                self.stats.record_store_read_error();
                self.stats.record_miss();
                warn!("Cache read failed, treating as miss: {}", err);
                None
            }
        }
    }

    /// Joins the active job for the key or creates it.
    async fn schedule(&self, request: &ComputationRequest) -> Result<JobHandle> {
        let key = request.cache_key.as_str();
        let mut last_err = DispatchError::DuplicateId(key.to_string());

        for attempt in 1..=SCHEDULE_ATTEMPTS {
            if let Some(handle) = self.dispatcher.lookup(key).await {
                self.stats.record_join();
                debug!(
                    job_id = handle.job_id(),
                    finished = handle.is_finished(),
                    "Joined in-flight job"
                );
                return Ok(handle);
            }

            match self.dispatcher.enqueue(key, request.payload()).await {
                Ok(handle) => {
                    self.stats.record_dispatch();
                    info!("Dispatched computation");
                    return Ok(handle);
                }
                Err(err) => {
                    // Whatever the reason, a job that exists now is as good
                    // as one we created.
                    if let Some(handle) = self.dispatcher.lookup(key).await {
                        self.stats.record_join();
                        debug!("Lost enqueue race, joined existing job: {}", err);
                        return Ok(handle);
                    }
                    let retry = matches!(err, DispatchError::DuplicateId(_));
                    last_err = err;
                    if !retry {
                        break;
                    }
                    debug!(attempt, "Conflicting job finished before lookup, retrying");
                }
            }
        }

        self.stats.record_failure();
        warn!("Failed to schedule computation: {}", last_err);
        Err(ResolveError::Dispatch {
            key: key.to_string(),
            source: last_err,
        })
    }

    /// Writes a computed value to the cache. Failures are logged and counted,
    /// never returned.
    async fn write_cached(&self, key: &str, value: &Value, ttl: u64) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                self.stats.record_cache_write_failure();
                warn!(cache_key = %key, "Could not serialize result: {}", err);
                return false;
            }
        };

        match self.cache.set(key, raw, ttl).await {
            Ok(()) => {
                debug!(cache_key = %key, ttl, "Cached computed value");
                true
            }
            Err(err) => {
                self.stats.record_cache_write_failure();
                warn!(cache_key = %key, "Cache write failed, returning result anyway: {}", err);
                false
            }
        }
    }

    fn spawn_late_fill(&self, handle: JobHandle, request: &ComputationRequest) {
        let this = self.clone();
        let key = request.cache_key.clone();
        let ttl = request.cache_ttl;

        tokio::spawn(async move {
            match handle.wait().await {
                Ok(value) => {
                    if this.write_cached(&key, &value, ttl).await {
                        this.stats.record_late_fill();
                        debug!(cache_key = %key, "Late result cached after caller timed out");
                    }
                }
                Err(err) => {
                    debug!(cache_key = %key, "Timed-out job ended without a value: {}", err);
                }
            }
        });
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("late_fill", &self.late_fill)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

fn decode<R: DeserializeOwned>(value: Value) -> Result<R> {
    serde_json::from_value(value)
        .map_err(|err| ResolveError::InvalidRequest(format!("result has unexpected shape: {err}")))
}
