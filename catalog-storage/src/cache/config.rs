//! Cache decorator configuration.

use std::time::Duration;

use super::key::{build_cache_key, CacheCategory, KEY_SEPARATOR};

/// Expiry and timeout settings for the caching decorator.
///
/// Immutable once the decorator is built; the decorator holds no other state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for the full album list.
    pub ttl_all: Duration,
    /// TTL for single albums by id.
    pub ttl_by_id: Duration,
    /// TTL for per-artist lists.
    pub ttl_by_artist: Duration,
    /// TTL for the in-stock list.
    pub ttl_in_stock: Duration,
    /// Upper bound on any single cache operation.
    pub operation_timeout: Duration,
    /// Namespace prepended to every key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_all: Duration::from_secs(60),
            ttl_by_id: Duration::from_secs(5 * 60),
            ttl_by_artist: Duration::from_secs(2 * 60),
            ttl_in_stock: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(2),
            key_prefix: "album".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL for one category.
    pub fn with_ttl(mut self, category: CacheCategory, ttl: Duration) -> Self {
        match category {
            CacheCategory::All => self.ttl_all = ttl,
            CacheCategory::Id => self.ttl_by_id = ttl,
            CacheCategory::Artist => self.ttl_by_artist = ttl,
            CacheCategory::Stock => self.ttl_in_stock = ttl,
        }
        self
    }

    /// Set the cache operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set the key prefix. The key separator `:` is stripped from it.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.key_prefix = if prefix.contains(KEY_SEPARATOR) {
            prefix.replace(KEY_SEPARATOR, "")
        } else {
            prefix
        };
        self
    }

    /// TTL for a category.
    pub fn ttl_for(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::All => self.ttl_all,
            CacheCategory::Id => self.ttl_by_id,
            CacheCategory::Artist => self.ttl_by_artist,
            CacheCategory::Stock => self.ttl_in_stock,
        }
    }

    /// The smallest configured TTL.
    pub fn shortest_ttl(&self) -> Duration {
        [self.ttl_all, self.ttl_by_id, self.ttl_by_artist, self.ttl_in_stock]
            .into_iter()
            .min()
            .unwrap_or(self.ttl_in_stock)
    }

    /// Cache key for a category and discriminator under this prefix.
    pub fn key(&self, category: CacheCategory, discriminator: &str) -> String {
        build_cache_key(&self.key_prefix, category, discriminator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttls() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl_for(CacheCategory::All), Duration::from_secs(60));
        assert_eq!(config.ttl_for(CacheCategory::Id), Duration::from_secs(300));
        assert_eq!(config.ttl_for(CacheCategory::Artist), Duration::from_secs(120));
        assert_eq!(config.ttl_for(CacheCategory::Stock), Duration::from_secs(30));
        assert_eq!(config.operation_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_overrides() {
        let config = CacheConfig::new()
            .with_ttl(CacheCategory::Stock, Duration::from_secs(5))
            .with_operation_timeout(Duration::from_millis(250))
            .with_key_prefix("shop");

        assert_eq!(config.ttl_in_stock, Duration::from_secs(5));
        assert_eq!(config.ttl_all, Duration::from_secs(60));
        assert_eq!(config.operation_timeout, Duration::from_millis(250));
        assert_eq!(config.key(CacheCategory::Id, "7"), "shop:id:7");
        assert_eq!(config.shortest_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_prefix_separator_is_stripped() {
        let config = CacheConfig::new().with_key_prefix("shop:album");
        assert_eq!(config.key_prefix, "shopalbum");

        // Unstripped, both would be "a:artist:id:x".
        let nested = CacheConfig::new().with_key_prefix("a:artist");
        let plain = CacheConfig::new().with_key_prefix("a");
        assert_ne!(
            nested.key(CacheCategory::Id, "x"),
            plain.key(CacheCategory::Artist, "id:x")
        );
    }
}
