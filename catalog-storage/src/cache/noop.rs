//! Cache backend that stores nothing.
//!
//! Every read misses and every write succeeds, so wrapping a store with it
//! behaves exactly like the bare store. Used when caching is switched off.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{CacheBackend, CacheResult};

/// Always-miss cache backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheBackend;

#[async_trait]
impl CacheBackend for NoopCacheBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_never_hits() {
        let cache = NoopCacheBackend;
        cache.set("k", "v".to_string(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.ping().await.is_ok());
    }
}
