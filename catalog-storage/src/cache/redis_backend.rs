//! Redis cache backend.
//!
//! Uses a multiplexed `ConnectionManager`, which reconnects on its own after
//! a dropped connection. Each operation clones the manager handle.

use std::time::Duration;

use async_trait::async_trait;
use catalog_core::CacheError;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::traits::{CacheBackend, CacheResult};

/// Expiry argument for a write: `EX` for whole seconds, `PX` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Seconds(u64),
    Millis(u64),
}

impl Expiry {
    fn from_ttl(ttl: Duration) -> Self {
        if ttl.subsec_nanos() == 0 && ttl.as_secs() > 0 {
            Expiry::Seconds(ttl.as_secs())
        } else {
            // PX rejects zero; round sub-millisecond TTLs up.
            let millis = ttl.as_nanos().div_ceil(1_000_000).max(1);
            Expiry::Millis(u64::try_from(millis).unwrap_or(u64::MAX))
        }
    }
}

/// Shared cache backed by a Redis server.
#[derive(Clone)]
pub struct RedisCacheBackend {
    manager: ConnectionManager,
}

impl std::fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheBackend").finish_non_exhaustive()
    }
}

impl RedisCacheBackend {
    /// Connect to `url` and verify the server answers `PING`.
    ///
    /// Both the connection and the ping are bounded by `connect_timeout`.
    pub async fn connect(url: &str, connect_timeout: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Connection {
            reason: format!("invalid redis url: {}", e),
        })?;

        let manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout {
                operation: "connect".to_string(),
                after: connect_timeout,
            })?
            .map_err(|e| CacheError::Connection {
                reason: e.to_string(),
            })?;

        let backend = Self { manager };
        tokio::time::timeout(connect_timeout, backend.ping())
            .await
            .map_err(|_| CacheError::Timeout {
                operation: "ping".to_string(),
                after: connect_timeout,
            })??;

        tracing::info!("Connected to redis cache");
        Ok(backend)
    }

    fn backend_error(err: redis::RedisError) -> CacheError {
        CacheError::Backend {
            backend: "redis".to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(Self::backend_error)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        let result = match Expiry::from_ttl(ttl) {
            Expiry::Seconds(seconds) => conn.set_ex::<_, _, ()>(key, value, seconds).await,
            Expiry::Millis(millis) => conn.pset_ex::<_, _, ()>(key, value, millis).await,
        };
        result.map_err(Self::backend_error)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await.map_err(Self::backend_error)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::backend_error)?;
        if pong.eq_ignore_ascii_case("pong") {
            Ok(())
        } else {
            Err(CacheError::Backend {
                backend: "redis".to_string(),
                reason: format!("unexpected PING reply: {}", pong),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_second_ttls_use_seconds() {
        assert_eq!(Expiry::from_ttl(Duration::from_secs(60)), Expiry::Seconds(60));
        assert_eq!(Expiry::from_ttl(Duration::from_secs(300)), Expiry::Seconds(300));
    }

    #[test]
    fn test_sub_second_ttls_are_not_stretched() {
        assert_eq!(Expiry::from_ttl(Duration::from_millis(250)), Expiry::Millis(250));
        assert_eq!(Expiry::from_ttl(Duration::from_millis(1500)), Expiry::Millis(1500));
        assert_eq!(Expiry::from_ttl(Duration::from_micros(10)), Expiry::Millis(1));
        assert_eq!(Expiry::from_ttl(Duration::ZERO), Expiry::Millis(1));
    }
}
