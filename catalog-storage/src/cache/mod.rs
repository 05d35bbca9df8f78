//! Album cache layer.
//!
//! A key-value side channel in front of the record store:
//!
//! - [`CacheBackend`]: string get/set/delete with per-key expiry
//! - [`CacheCategory`] and [`build_cache_key`]: deterministic key derivation
//! - [`CacheConfig`]: per-category TTLs and the cache operation timeout
//! - [`CachedAlbumRepository`]: the read-through / write-invalidate decorator
//!
//! # Consistency model
//!
//! Cached entries carry no version. Staleness is bounded by expiry and by
//! explicit deletion of the keys a write can affect. Population and
//! invalidation run on detached tasks, so a read racing a write may observe
//! the previous value for at most one TTL of that category.

mod cached_repository;
mod config;
mod key;
mod memory_backend;
mod noop;
#[cfg(feature = "redis")]
mod redis_backend;
mod traits;

pub use cached_repository::CachedAlbumRepository;
pub use config::CacheConfig;
pub use key::{build_cache_key, CacheCategory, KEY_SEPARATOR};
pub use memory_backend::InMemoryCacheBackend;
pub use noop::NoopCacheBackend;
#[cfg(feature = "redis")]
pub use redis_backend::RedisCacheBackend;
pub use traits::{CacheBackend, CacheResult, CacheStats};
