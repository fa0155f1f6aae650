//! Cache Backend Module
//!
//! The narrow capability the coordinator consumes, plus an in-process
//! implementation over [`CacheStore`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::CacheStore;
use crate::error::StoreError;

/// Key/value store with per-entry TTL.
///
/// Implementations own expiry: a value returned by `get` must not have
/// outlived the TTL it was written with.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the live value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key` for `ttl_seconds` (0 = no expiry).
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// == Memory Backend ==
/// Shared in-memory backend.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: Arc<RwLock<CacheStore>>,
}

impl MemoryBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(max_entries))),
        }
    }

    /// Handle to the underlying store, used by the sweep task.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        self.store.clone()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn evictions(&self) -> u64 {
        self.store.read().await.evictions()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        // Write lock: reads refresh LRU order and drop expired entries.
        Ok(self.store.write().await.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
        self.store
            .write()
            .await
            .set(key.to_string(), value, ttl_seconds)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store.write().await.delete(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new(10);

        backend.set("k", "v".to_string(), 60).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(backend.len().await, 1);

        backend.delete("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let backend = MemoryBackend::new(10);
        assert!(backend.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let backend = MemoryBackend::new(10);
        let other = backend.clone();

        backend.set("k", "v".to_string(), 60).await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
