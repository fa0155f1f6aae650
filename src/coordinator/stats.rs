//! Resolve Statistics Module
//!
//! Lock-free counters describing how `resolve` calls were satisfied.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Resolve Stats ==
#[derive(Debug, Default)]
pub struct ResolveStats {
    hits: AtomicU64,
    misses: AtomicU64,
    corrupt_entries: AtomicU64,
    store_read_errors: AtomicU64,
    jobs_dispatched: AtomicU64,
    jobs_joined: AtomicU64,
    timeouts: AtomicU64,
    failures: AtomicU64,
    cache_write_failures: AtomicU64,
    late_fills: AtomicU64,
}

/// Point-in-time copy of [`ResolveStats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub corrupt_entries: u64,
    pub store_read_errors: u64,
    pub jobs_dispatched: u64,
    pub jobs_joined: u64,
    pub timeouts: u64,
    pub failures: u64,
    pub cache_write_failures: u64,
    pub late_fills: u64,
}

impl ResolveStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corrupt_entry(&self) {
        self.corrupt_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_read_error(&self) {
        self.store_read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self) {
        self.jobs_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_join(&self) {
        self.jobs_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_late_fill(&self) {
        self.late_fills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            corrupt_entries: self.corrupt_entries.load(Ordering::Relaxed),
            store_read_errors: self.store_read_errors.load(Ordering::Relaxed),
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            jobs_joined: self.jobs_joined.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
            late_fills: self.late_fills.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
