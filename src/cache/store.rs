//! Cache Store Module
//!
//! Synchronous TTL + LRU map backing the in-memory cache backend.

use std::collections::HashMap;

use crate::cache::entry::now_ms;
use crate::cache::{CacheEntry, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::StoreError;

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    max_entries: usize,
    evictions: u64,
}

impl CacheStore {
    /// Creates a store holding at most `max_entries` values.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries,
            evictions: 0,
        }
    }

    /// Stores a value, replacing any previous one and resetting its TTL.
    ///
    /// At capacity the least recently used key is evicted first.
    pub fn set(&mut self, key: String, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(StoreError::InvalidRequest(format!(
                "key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(StoreError::InvalidRequest(format!(
                "value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            // Prefer dropping something already dead over a live LRU victim.
            if self.cleanup_expired() == 0 {
                let victim = self.lru.evict_oldest().ok_or_else(|| {
                    StoreError::CapacityExhausted("no entry available for eviction".to_string())
                })?;
                self.entries.remove(&victim);
                self.evictions += 1;
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, ttl_seconds));
        Ok(())
    }

    /// Returns the live value for `key`, dropping it if it has expired.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = self.entries.get(key)?.is_expired();
        if expired {
            self.remove(key);
            return None;
        }

        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Removes `key`. Returns whether a value was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key)
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live entries pushed out by capacity pressure so far.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }
}
