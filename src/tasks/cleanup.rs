//! TTL Sweep Task
//!
//! Reads already hide expired entries; the sweep reclaims the space they hold.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::MemoryBackend;

/// Spawns a task that removes expired entries from `cache` every
/// `interval_secs` seconds. Abort the returned handle to stop it.
pub fn spawn_cleanup_task(cache: MemoryBackend, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));
    let store = cache.store();

    tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), "Starting TTL sweep task");

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can have expired yet.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = store.write().await.cleanup_expired();
            if removed > 0 {
                info!(removed, "TTL sweep removed expired entries");
            } else {
                debug!("TTL sweep found nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;

    #[tokio::test]
    async fn test_sweep_reclaims_expired_entries() {
        let cache = MemoryBackend::new(100);
        cache.set("short", "1".to_string(), 1).await.unwrap();
        cache.set("long", "2".to_string(), 3600).await.unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        // len() does not expire lazily, so only the sweep can shrink it.
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("2"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_can_be_aborted() {
        let handle = spawn_cleanup_task(MemoryBackend::new(10), 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }
}
