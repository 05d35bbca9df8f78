//! Read-through / write-invalidate caching decorator.
//!
//! `CachedAlbumRepository` implements [`AlbumRepository`] by wrapping another
//! repository and a [`CacheBackend`].
//!
//! Reads check the cache under a bounded timeout and fall back to the inner
//! store on miss, backend error, timeout, or an undecodable payload. A
//! successful store read is written back to the cache on a detached task.
//!
//! Writes go to the store first. Only after the store succeeds are the
//! affected keys deleted, again on a detached task:
//!
//! | write    | invalidated keys                              | warmed |
//! |----------|-----------------------------------------------|--------|
//! | create   | artist(new), stock                            | id     |
//! | update   | id, artist(old), artist(new), stock           |        |
//! | delete   | id, artist(old), stock                        |        |
//!
//! The `all` list is never deleted explicitly; it ages out after its TTL.
//! Cache failures are logged and never reach the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::{Album, AlbumInput, CatalogResult};
use serde::{de::DeserializeOwned, Serialize};

use super::config::CacheConfig;
use super::key::CacheCategory;
use super::traits::CacheBackend;
use crate::AlbumRepository;

/// Album repository with a cache in front of it.
///
/// # Type Parameters
///
/// - `R`: the wrapped store
/// - `C`: the cache backend
///
/// Both may be trait objects, e.g.
/// `CachedAlbumRepository<dyn AlbumRepository, dyn CacheBackend>`.
pub struct CachedAlbumRepository<R: ?Sized, C: ?Sized> {
    repo: Arc<R>,
    cache: Arc<C>,
    config: CacheConfig,
}

impl<R, C> CachedAlbumRepository<R, C>
where
    R: AlbumRepository + ?Sized + 'static,
    C: CacheBackend + ?Sized + 'static,
{
    /// Wrap `repo` with `cache`.
    pub fn new(repo: Arc<R>, cache: Arc<C>, config: CacheConfig) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }

    /// Wrap `repo` with `cache` using default TTLs and timeout.
    pub fn with_defaults(repo: Arc<R>, cache: Arc<C>) -> Self {
        Self::new(repo, cache, CacheConfig::default())
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a reference to the cache backend.
    pub fn backend(&self) -> &C {
        &self.cache
    }

    /// Get a reference to the wrapped store.
    pub fn inner(&self) -> &R {
        &self.repo
    }

    // ========================================================================
    // READ PATH
    // ========================================================================

    /// Serve from cache when possible, otherwise load from the store and
    /// schedule population.
    async fn read_through<T, F, Fut>(
        &self,
        category: CacheCategory,
        discriminator: &str,
        load: F,
    ) -> CatalogResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CatalogResult<T>> + Send,
    {
        let key = self.config.key(category, discriminator);

        if let Some(cached) = self.lookup::<T>(&key).await {
            return Ok(cached);
        }

        let value = load().await?;
        self.populate(key, &value, self.config.ttl_for(category));
        Ok(value)
    }

    /// Bounded cache read. Every failure mode collapses to `None`.
    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let timeout = self.config.operation_timeout;
        let raw = match tokio::time::timeout(timeout, self.cache.get(key)).await {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => {
                tracing::debug!(key, "cache miss");
                return None;
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    key,
                    backend = self.cache.name(),
                    error = %err,
                    "cache read failed, falling back to store"
                );
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    key,
                    backend = self.cache.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "cache read timed out, falling back to store"
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                Some(value)
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Fire-and-forget cache write.
    fn populate<T: Serialize>(&self, key: String, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to serialize value for cache");
                return;
            }
        };

        let cache = Arc::clone(&self.cache);
        let timeout = self.config.operation_timeout;
        spawn_detached("populate", async move {
            match tokio::time::timeout(timeout, cache.set(&key, payload, ttl)).await {
                Ok(Ok(())) => {
                    tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache populated")
                }
                Ok(Err(err)) => {
                    tracing::warn!(key = %key, error = %err, "cache population failed")
                }
                Err(_) => tracing::warn!(key = %key, "cache population timed out"),
            }
        });
    }

    // ========================================================================
    // WRITE PATH
    // ========================================================================

    /// Fire-and-forget deletion of every key in `keys`.
    fn invalidate(&self, mut keys: Vec<String>) {
        keys.sort();
        keys.dedup();

        let cache = Arc::clone(&self.cache);
        let timeout = self.config.operation_timeout;
        spawn_detached("invalidate", async move {
            for key in keys {
                match tokio::time::timeout(timeout, cache.delete(&key)).await {
                    Ok(Ok(())) => tracing::debug!(key = %key, "cache entry invalidated"),
                    Ok(Err(err)) => {
                        tracing::warn!(key = %key, error = %err, "cache invalidation failed")
                    }
                    Err(_) => tracing::warn!(key = %key, "cache invalidation timed out"),
                }
            }
        });
    }

    /// Best-effort read of the pre-mutation record from the inner store.
    async fn previous(&self, id: &str) -> Option<Album> {
        match self.repo.get_by_id(id).await {
            Ok(album) => Some(album),
            Err(err) => {
                tracing::debug!(id, error = %err, "could not read record before write");
                None
            }
        }
    }

    fn artist_key(&self, artist: &str) -> String {
        self.config.key(CacheCategory::Artist, artist)
    }

    fn stock_key(&self) -> String {
        self.config.key(CacheCategory::Stock, "")
    }

    fn id_key(&self, id: &str) -> String {
        self.config.key(CacheCategory::Id, id)
    }
}

/// Spawn `task` on the current tokio runtime without awaiting it.
///
/// Outside a runtime the task is dropped and logged; cache upkeep is never
/// worth a panic.
fn spawn_detached<F>(label: &'static str, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => tracing::warn!(task = label, "no async runtime, skipping cache task"),
    }
}

#[async_trait]
impl<R, C> AlbumRepository for CachedAlbumRepository<R, C>
where
    R: AlbumRepository + ?Sized + 'static,
    C: CacheBackend + ?Sized + 'static,
{
    async fn get_all(&self) -> CatalogResult<Vec<Album>> {
        self.read_through(CacheCategory::All, "", || self.repo.get_all())
            .await
    }

    async fn get_by_id(&self, id: &str) -> CatalogResult<Album> {
        self.read_through(CacheCategory::Id, id, || self.repo.get_by_id(id))
            .await
    }

    async fn create(&self, input: AlbumInput) -> CatalogResult<Album> {
        let album = self.repo.create(input).await?;

        self.invalidate(vec![self.artist_key(&album.artist), self.stock_key()]);
        self.populate(
            self.id_key(&album.id),
            &album,
            self.config.ttl_for(CacheCategory::Id),
        );
        Ok(album)
    }

    async fn update(&self, album: Album) -> CatalogResult<Album> {
        let previous = self.previous(&album.id).await;
        let updated = self.repo.update(album).await?;

        let mut keys = vec![
            self.id_key(&updated.id),
            self.artist_key(&updated.artist),
            self.stock_key(),
        ];
        if let Some(previous) = previous {
            keys.push(self.artist_key(&previous.artist));
        }
        self.invalidate(keys);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> CatalogResult<()> {
        let previous = self.previous(id).await;
        self.repo.delete(id).await?;

        let mut keys = vec![self.id_key(id), self.stock_key()];
        if let Some(previous) = previous {
            keys.push(self.artist_key(&previous.artist));
        }
        self.invalidate(keys);
        Ok(())
    }

    async fn get_by_artist(&self, artist: &str) -> CatalogResult<Vec<Album>> {
        self.read_through(CacheCategory::Artist, artist, || {
            self.repo.get_by_artist(artist)
        })
        .await
    }

    async fn get_in_stock(&self) -> CatalogResult<Vec<Album>> {
        self.read_through(CacheCategory::Stock, "", || self.repo.get_in_stock())
            .await
    }
}
