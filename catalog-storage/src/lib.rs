//! Catalog Storage
//!
//! The `AlbumRepository` capability set and its implementations:
//!
//! - [`InMemoryAlbumRepository`]: arena-backed store for development and tests
//! - [`CachedAlbumRepository`]: read-through / write-invalidate decorator that
//!   wraps any other repository and a [`CacheBackend`]
//!
//! The Postgres store lives in the API crate next to its connection pool.
//! Callers hold `Arc<dyn AlbumRepository>` and cannot tell which variant they
//! were given.

use async_trait::async_trait;
use catalog_core::{Album, AlbumInput, CatalogResult};

pub mod cache;
pub mod memory;

pub use cache::{
    build_cache_key, CacheBackend, CacheCategory, CacheConfig, CacheResult, CacheStats,
    CachedAlbumRepository, InMemoryCacheBackend, NoopCacheBackend, KEY_SEPARATOR,
};
#[cfg(feature = "redis")]
pub use cache::RedisCacheBackend;
pub use memory::InMemoryAlbumRepository;

// ============================================================================
// REPOSITORY TRAIT
// ============================================================================

/// Durable CRUD contract for album records.
///
/// Ordering: `get_all` and `get_in_stock` return newest `created_at` first;
/// `get_by_artist` returns highest `year` first. The two list queries return
/// an empty vector when nothing matches.
///
/// `get_by_id`, `update` and `delete` report a missing record as
/// `StorageError::NotFound`, never as a generic failure.
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// All albums, newest first.
    async fn get_all(&self) -> CatalogResult<Vec<Album>>;

    /// A single album by id.
    async fn get_by_id(&self, id: &str) -> CatalogResult<Album>;

    /// Insert a new album. The store assigns the id and both timestamps.
    async fn create(&self, input: AlbumInput) -> CatalogResult<Album>;

    /// Replace the caller-controlled fields of an existing album.
    ///
    /// The stored `created_at` is kept and `updated_at` is refreshed.
    async fn update(&self, album: Album) -> CatalogResult<Album>;

    /// Remove an album.
    async fn delete(&self, id: &str) -> CatalogResult<()>;

    /// Albums by exact artist name, highest year first.
    async fn get_by_artist(&self, artist: &str) -> CatalogResult<Vec<Album>>;

    /// Albums flagged in stock, newest first.
    async fn get_in_stock(&self) -> CatalogResult<Vec<Album>>;
}

/// Sort in place by `created_at` descending, id descending on ties.
pub(crate) fn sort_newest_first(albums: &mut [Album]) {
    albums.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Sort in place by `year` descending, then newest first.
pub(crate) fn sort_by_year_desc(albums: &mut [Album]) {
    albums.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}
