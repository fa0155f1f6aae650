//! Cache Entry Module
//!
//! A serialized value plus the instant it stops being visible.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// One stored value with its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized value
    pub value: String,
    /// Expiry timestamp (Unix milliseconds), None = never expires
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    /// Creates an entry written now. A TTL of zero seconds means no expiry.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        let expires_at =
            (ttl_seconds > 0).then(|| now_ms().saturating_add(ttl_seconds.saturating_mul(1000)));

        Self { value, expires_at }
    }

    /// True once the current time has reached the expiry timestamp.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }

    pub(crate) fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }
}

/// Current Unix timestamp in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
