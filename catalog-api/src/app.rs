//! Application wiring
//!
//! Turns an [`ApiConfig`] into a ready [`AppState`]: picks the record store,
//! wraps it with the configured cache and hands the result to the service.
//! With caching disabled the decorator runs over an always-miss backend.

use std::sync::Arc;

use catalog_storage::{
    AlbumRepository, CacheBackend, CacheConfig, CachedAlbumRepository, InMemoryAlbumRepository,
    InMemoryCacheBackend, NoopCacheBackend, RedisCacheBackend,
};

use crate::config::{cache_config_from_env, ApiConfig, CacheKind, RedisConfig, StoreKind};
use crate::db::{DbClient, DbConfig, PostgresAlbumRepository};
use crate::error::{ApiError, ApiResult};
use crate::routes::health::HealthState;
use crate::services::AlbumService;
use crate::state::AppState;

/// Connect every backend named in `config` and assemble the shared state.
///
/// Postgres and Redis are read from their own `from_env` settings. A backend
/// that cannot be reached fails startup.
pub async fn build_state(config: &ApiConfig, service_name: &str) -> ApiResult<AppState> {
    let mut health = HealthState::new(service_name, config.store.to_string());

    let store: Arc<dyn AlbumRepository> = match config.store {
        StoreKind::Postgres => {
            let db = DbClient::connect_with_retry(&DbConfig::from_env()).await?;
            let repo = PostgresAlbumRepository::new(&db);
            health = health.with_db(db);
            Arc::new(repo)
        }
        StoreKind::Memory => {
            tracing::info!("Using in-memory record store with seed catalog");
            Arc::new(InMemoryAlbumRepository::seeded())
        }
    };

    let cache_config = cache_config_from_env();
    let cache = connect_cache(config.cache, &cache_config).await?;
    if config.cache != CacheKind::None {
        health = health.with_cache(cache.clone(), cache_config.operation_timeout);
    }
    let repo = with_cache(store, cache, cache_config);

    let service = Arc::new(AlbumService::new(repo));
    Ok(AppState::new(service, Arc::new(health)))
}

/// Wrap a store with the caching decorator.
pub fn with_cache(
    store: Arc<dyn AlbumRepository>,
    cache: Arc<dyn CacheBackend>,
    config: CacheConfig,
) -> Arc<dyn AlbumRepository> {
    tracing::info!(
        backend = cache.name(),
        timeout_ms = config.operation_timeout.as_millis() as u64,
        "Cache decorator installed"
    );
    Arc::new(CachedAlbumRepository::new(store, cache, config))
}

async fn connect_cache(kind: CacheKind, config: &CacheConfig) -> ApiResult<Arc<dyn CacheBackend>> {
    match kind {
        CacheKind::Redis => {
            let redis = RedisConfig::from_env();
            let backend = RedisCacheBackend::connect(&redis.url(), redis.connect_timeout)
                .await
                .map_err(|e| {
                    ApiError::service_unavailable(format!(
                        "Failed to connect to redis at {}:{}: {}",
                        redis.host, redis.port, e
                    ))
                })?;
            Ok(Arc::new(backend))
        }
        CacheKind::Memory => Ok(memory_cache(config)),
        CacheKind::None => Ok(Arc::new(NoopCacheBackend)),
    }
}

/// In-process cache with a background purge at the shortest TTL.
fn memory_cache(config: &CacheConfig) -> Arc<InMemoryCacheBackend> {
    let backend = Arc::new(InMemoryCacheBackend::new());
    backend.spawn_purger(config.shortest_ttl());
    backend
}
