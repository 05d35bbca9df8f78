//! API Configuration Module
//!
//! Server, backend selection, CORS, Redis and cache settings. Everything is
//! loaded from environment variables with development-friendly defaults.
//! Database settings live next to the pool in `db.rs`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use catalog_storage::{CacheCategory, CacheConfig, KEY_SEPARATOR};

// ============================================================================
// BACKEND SELECTION
// ============================================================================

/// Which record store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            "memory" | "mem" | "in-memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store kind: {}", other)),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Postgres => write!(f, "postgres"),
            StoreKind::Memory => write!(f, "memory"),
        }
    }
}

/// Which cache backend sits in front of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Redis,
    Memory,
    None,
}

impl FromStr for CacheKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheKind::Redis),
            "memory" | "mem" | "in-memory" => Ok(CacheKind::Memory),
            "none" | "off" | "disabled" => Ok(CacheKind::None),
            other => Err(format!("unknown cache kind: {}", other)),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Redis => write!(f, "redis"),
            CacheKind::Memory => write!(f, "memory"),
            CacheKind::None => write!(f, "none"),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Server and wiring configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface both servers bind to.
    pub bind_host: String,

    /// REST port.
    pub http_port: u16,

    /// gRPC port.
    pub grpc_port: u16,

    /// Record store backend.
    pub store: StoreKind,

    /// Cache backend.
    pub cache: CacheKind,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            http_port: 8080,
            grpc_port: 50051,
            store: StoreKind::Postgres,
            cache: CacheKind::Redis,
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CATALOG_API_BIND`: Bind interface (default: 0.0.0.0)
    /// - `PORT` / `CATALOG_API_PORT`: REST port (default: 8080)
    /// - `CATALOG_GRPC_PORT`: gRPC port (default: 50051)
    /// - `CATALOG_STORE`: `postgres` or `memory` (default: postgres)
    /// - `CATALOG_CACHE`: `redis`, `memory` or `none` (default: redis)
    /// - `CATALOG_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `CATALOG_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    ///
    /// Unparseable values fall back to the default and are logged.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host =
            std::env::var("CATALOG_API_BIND").unwrap_or_else(|_| defaults.bind_host.clone());

        let http_port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("CATALOG_API_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.http_port);

        let grpc_port = std::env::var("CATALOG_GRPC_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.grpc_port);

        let store = parse_or_default("CATALOG_STORE", defaults.store);
        let cache = parse_or_default("CATALOG_CACHE", defaults.cache);

        let cors_origins = std::env::var("CATALOG_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("CATALOG_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        Self {
            bind_host,
            http_port,
            grpc_port,
            store,
            cache,
            cors_origins,
            cors_max_age_secs,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr<Err = String> + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|err: String| {
            tracing::warn!(key, error = %err, "Ignoring invalid setting");
            default
        }),
        Err(_) => default,
    }
}

// ============================================================================
// REDIS CONFIGURATION
// ============================================================================

/// Redis connection settings.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: i64,
    /// Bound on connecting and the initial PING.
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: String::new(),
            db: 0,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Create RedisConfig from `CATALOG_REDIS_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("CATALOG_REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("CATALOG_REDIS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(6379),
            password: std::env::var("CATALOG_REDIS_PASSWORD").unwrap_or_default(),
            db: std::env::var("CATALOG_REDIS_DB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Connection URL in the form the redis client expects.
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                self.password, self.host, self.port, self.db
            )
        }
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// Build the decorator configuration, applying `CATALOG_CACHE_*` overrides.
///
/// - `CATALOG_CACHE_TIMEOUT_MS`: per-operation bound (default: 2000)
/// - `CATALOG_CACHE_TTL_ALL_SECS` (60), `CATALOG_CACHE_TTL_ID_SECS` (300),
///   `CATALOG_CACHE_TTL_ARTIST_SECS` (120), `CATALOG_CACHE_TTL_STOCK_SECS` (30)
/// - `CATALOG_CACHE_KEY_PREFIX` (album)
pub fn cache_config_from_env() -> CacheConfig {
    let mut config = CacheConfig::default();

    if let Some(ms) = env_u64("CATALOG_CACHE_TIMEOUT_MS") {
        config = config.with_operation_timeout(Duration::from_millis(ms));
    }

    let ttl_vars = [
        (CacheCategory::All, "CATALOG_CACHE_TTL_ALL_SECS"),
        (CacheCategory::Id, "CATALOG_CACHE_TTL_ID_SECS"),
        (CacheCategory::Artist, "CATALOG_CACHE_TTL_ARTIST_SECS"),
        (CacheCategory::Stock, "CATALOG_CACHE_TTL_STOCK_SECS"),
    ];
    for (category, key) in ttl_vars {
        if let Some(secs) = env_u64(key) {
            config = config.with_ttl(category, Duration::from_secs(secs));
        }
    }

    if let Ok(prefix) = std::env::var("CATALOG_CACHE_KEY_PREFIX") {
        let prefix = prefix.trim();
        if prefix.contains(KEY_SEPARATOR) {
            tracing::warn!(
                prefix,
                "CATALOG_CACHE_KEY_PREFIX contains '{}', stripping it",
                KEY_SEPARATOR
            );
        }
        let stripped = prefix.replace(KEY_SEPARATOR, "");
        if !stripped.is_empty() {
            config = config.with_key_prefix(stripped);
        }
    }

    config
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
