//! Process-local cache backend.
//!
//! A concurrent map of key to (value, deadline). Expired entries are dropped
//! lazily on access or in bulk by [`InMemoryCacheBackend::purge_expired`],
//! which [`InMemoryCacheBackend::spawn_purger`] runs on an interval.
//! Deadlines use the tokio clock so paused-time tests can advance past a TTL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::traits::{CacheBackend, CacheResult, CacheStats};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory TTL cache.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
}

impl InMemoryCacheBackend {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `key` holds an unexpired value. Does not touch statistics.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Purge expired entries every `period` until the cache is dropped.
    ///
    /// The task holds a weak handle, so it exits on the first tick after the
    /// last strong reference goes away. Must be called inside a tokio runtime.
    pub fn spawn_purger(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = period.max(Duration::from_millis(100));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired cache entries");
                }
            }
        })
    }

    /// Snapshot of usage counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };

        match value {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            None => {
                // Re-check under the shard lock so a concurrent fresh `set`
                // is not thrown away.
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(now))
                    .is_some()
                {
                    self.expirations.fetch_add(1, Ordering::Relaxed);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = InMemoryCacheBackend::new();
        cache
            .set("album:id:1", "payload".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("album:id:1").await.unwrap().as_deref(), Some("payload"));
        assert_eq!(cache.get("album:id:2").await.unwrap(), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = InMemoryCacheBackend::new();
        cache.set("k", "v".to_string(), Duration::from_secs(60)).await.unwrap();
        cache.delete("k").await.unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_never_served_past_ttl() {
        let cache = InMemoryCacheBackend::new();
        cache
            .set("album:stock:", "[]".to_string(), Duration::from_secs(30))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cache.get("album:stock:").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("album:stock:").await.unwrap(), None);
        assert_eq!(cache.stats().expirations, 1);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_keeps_live_entries() {
        let cache = InMemoryCacheBackend::new();
        cache.set("short", "a".to_string(), Duration::from_secs(1)).await.unwrap();
        cache.set("long", "b".to_string(), Duration::from_secs(100)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.contains("long"));
        assert!(!cache.contains("short"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purger_shrinks_cache_without_reads() {
        let cache = Arc::new(InMemoryCacheBackend::new());
        let purger = cache.spawn_purger(Duration::from_secs(30));

        for i in 0..1000 {
            cache
                .set(&format!("album:artist:nobody-{}", i), "[]".to_string(), Duration::from_secs(120))
                .await
                .unwrap();
        }
        cache.set("album:id:kept", "{}".to_string(), Duration::from_secs(3600)).await.unwrap();
        assert_eq!(cache.stats().entry_count, 1001);

        tokio::time::advance(Duration::from_secs(150)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.expirations, 1000);
        assert!(cache.contains("album:id:kept"));
        assert!(!purger.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purger_stops_when_cache_dropped() {
        let cache = Arc::new(InMemoryCacheBackend::new());
        let purger = cache.spawn_purger(Duration::from_secs(1));
        drop(cache);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(purger.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_extends_expiry() {
        let cache = InMemoryCacheBackend::new();
        cache.set("k", "old".to_string(), Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        cache.set("k", "new".to_string(), Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }
}
