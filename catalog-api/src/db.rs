//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! `PostgresAlbumRepository` that implements the record store contract on
//! top of it.
//!
//! Expected table:
//!
//! ```sql
//! CREATE TABLE albums (
//!     id          TEXT PRIMARY KEY,
//!     title       TEXT NOT NULL,
//!     artist      TEXT NOT NULL,
//!     price       NUMERIC(10, 2) NOT NULL,
//!     year        INTEGER NOT NULL,
//!     genre       TEXT,
//!     condition   TEXT,
//!     in_stock    BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at  TIMESTAMPTZ NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL
//! );
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use catalog_core::{
    new_album_id, Album, AlbumCondition, AlbumInput, CatalogError, CatalogResult, StorageError,
    Timestamp,
};
use catalog_storage::AlbumRepository;
use chrono::Utc;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create/recycle timeout for pooled connections
    pub timeout: Duration,
    /// Attempts made by [`DbClient::connect_with_retry`]
    pub connect_retries: u32,
    /// Pause between connection attempts
    pub retry_delay: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "jazz_shop".to_string(),
            user: "postgres".to_string(),
            password: "password".to_string(),
            max_size: 25,
            timeout: Duration::from_secs(30),
            connect_retries: 10,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from `CATALOG_DB_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("CATALOG_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("CATALOG_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("CATALOG_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("CATALOG_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("CATALOG_DB_PASSWORD").unwrap_or(defaults.password),
            max_size: std::env::var("CATALOG_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("CATALOG_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            connect_retries: std::env::var("CATALOG_DB_CONNECT_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.connect_retries),
            retry_delay: std::env::var("CATALOG_DB_RETRY_DELAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened until the first checkout.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts = Timeouts {
            wait: Some(self.timeout),
            create: Some(self.timeout),
            recycle: Some(self.timeout),
        };
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Cloneable handle to the connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Create a client and wait until the database answers.
    ///
    /// Tries `config.connect_retries` times, sleeping `config.retry_delay`
    /// between attempts.
    pub async fn connect_with_retry(config: &DbConfig) -> ApiResult<Self> {
        let client = Self::from_config(config)?;
        let attempts = config.connect_retries.max(1);

        for attempt in 1..=attempts {
            match client.health_check().await {
                Ok(()) => {
                    tracing::info!(
                        host = %config.host,
                        dbname = %config.dbname,
                        attempt,
                        "Connected to PostgreSQL"
                    );
                    return Ok(client);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Failed to connect to database"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(config.retry_delay).await;
                    }
                }
            }
        }

        Err(ApiError::service_unavailable(format!(
            "Failed to connect to database after {} attempts",
            attempts
        )))
    }

    /// The underlying pool, for callers that need raw connections.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;

        // Simple query to verify connectivity
        conn.query_one("SELECT 1", &[]).await?;

        Ok(())
    }
}

// ============================================================================
// POSTGRES ALBUM REPOSITORY
// ============================================================================

/// Record store backed by the `albums` table.
#[derive(Clone)]
pub struct PostgresAlbumRepository {
    pool: Pool,
}

impl PostgresAlbumRepository {
    pub fn new(db: &DbClient) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    async fn conn(&self) -> CatalogResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to acquire database connection");
            CatalogError::from(StorageError::ConnectionFailed {
                reason: e.to_string(),
            })
        })
    }

    async fn query_list(
        &self,
        operation: &'static str,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> CatalogResult<Vec<Album>> {
        let started = Instant::now();
        let result: CatalogResult<Vec<Album>> = async {
            let conn = self.conn().await?;
            let rows = conn
                .query(sql, params)
                .await
                .map_err(query_failed(operation))?;
            rows.iter().map(album_from_row).collect()
        }
        .await;
        observe(operation, started, &result);
        result
    }
}

const SELECT_ALL: &str = "SELECT id, title, artist, price::float8, year, genre, condition, \
     in_stock, created_at, updated_at FROM albums ORDER BY created_at DESC, id DESC";

const SELECT_BY_ID: &str = "SELECT id, title, artist, price::float8, year, genre, condition, \
     in_stock, created_at, updated_at FROM albums WHERE id = $1";

const SELECT_BY_ARTIST: &str = "SELECT id, title, artist, price::float8, year, genre, condition, \
     in_stock, created_at, updated_at FROM albums WHERE artist = $1 \
     ORDER BY year DESC, created_at DESC, id DESC";

const SELECT_IN_STOCK: &str = "SELECT id, title, artist, price::float8, year, genre, condition, \
     in_stock, created_at, updated_at FROM albums WHERE in_stock = TRUE \
     ORDER BY created_at DESC, id DESC";

const INSERT: &str = "INSERT INTO albums \
     (id, title, artist, price, year, genre, condition, in_stock, created_at, updated_at) \
     VALUES ($1, $2, $3, $4::float8, $5, $6, $7, $8, $9, $10) \
     RETURNING id, title, artist, price::float8, year, genre, condition, \
     in_stock, created_at, updated_at";

const UPDATE: &str = "UPDATE albums SET title = $1, artist = $2, price = $3::float8, year = $4, \
     genre = $5, condition = $6, in_stock = $7, updated_at = $8 WHERE id = $9 \
     RETURNING id, title, artist, price::float8, year, genre, condition, \
     in_stock, created_at, updated_at";

const DELETE: &str = "DELETE FROM albums WHERE id = $1";

#[async_trait]
impl AlbumRepository for PostgresAlbumRepository {
    async fn get_all(&self) -> CatalogResult<Vec<Album>> {
        self.query_list("get_all", SELECT_ALL, &[]).await
    }

    async fn get_by_id(&self, id: &str) -> CatalogResult<Album> {
        let started = Instant::now();
        let result: CatalogResult<Album> = async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(SELECT_BY_ID, &[&id])
                .await
                .map_err(query_failed("get_by_id"))?;
            match row {
                Some(row) => album_from_row(&row),
                None => Err(CatalogError::not_found(id)),
            }
        }
        .await;
        observe("get_by_id", started, &result);
        result
    }

    async fn create(&self, input: AlbumInput) -> CatalogResult<Album> {
        let started = Instant::now();
        let album = Album::from_input(new_album_id(), input, Utc::now());
        let condition = album.condition.map(|c| c.as_db_str());

        let result: CatalogResult<Album> = async {
            let conn = self.conn().await?;
            let row = conn
                .query_one(
                    INSERT,
                    &[
                        &album.id,
                        &album.title,
                        &album.artist,
                        &album.price,
                        &album.year,
                        &album.genre,
                        &condition,
                        &album.in_stock,
                        &album.created_at,
                        &album.updated_at,
                    ],
                )
                .await
                .map_err(query_failed("create"))?;
            album_from_row(&row)
        }
        .await;
        observe("create", started, &result);

        if let Ok(created) = &result {
            tracing::info!(id = %created.id, "Created album");
        }
        result
    }

    async fn update(&self, album: Album) -> CatalogResult<Album> {
        let started = Instant::now();
        let condition = album.condition.map(|c| c.as_db_str());
        let now: Timestamp = Utc::now();

        let result: CatalogResult<Album> = async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(
                    UPDATE,
                    &[
                        &album.title,
                        &album.artist,
                        &album.price,
                        &album.year,
                        &album.genre,
                        &condition,
                        &album.in_stock,
                        &now,
                        &album.id,
                    ],
                )
                .await
                .map_err(query_failed("update"))?;
            match row {
                Some(row) => album_from_row(&row),
                None => Err(CatalogError::not_found(album.id.as_str())),
            }
        }
        .await;
        observe("update", started, &result);

        if let Ok(updated) = &result {
            tracing::info!(id = %updated.id, "Updated album");
        }
        result
    }

    async fn delete(&self, id: &str) -> CatalogResult<()> {
        let started = Instant::now();
        let result: CatalogResult<()> = async {
            let conn = self.conn().await?;
            let affected = conn
                .execute(DELETE, &[&id])
                .await
                .map_err(query_failed("delete"))?;
            if affected == 0 {
                Err(CatalogError::not_found(id))
            } else {
                Ok(())
            }
        }
        .await;
        observe("delete", started, &result);

        if result.is_ok() {
            tracing::info!(id, "Deleted album");
        }
        result
    }

    async fn get_by_artist(&self, artist: &str) -> CatalogResult<Vec<Album>> {
        self.query_list("get_by_artist", SELECT_BY_ARTIST, &[&artist])
            .await
    }

    async fn get_in_stock(&self) -> CatalogResult<Vec<Album>> {
        self.query_list("get_in_stock", SELECT_IN_STOCK, &[]).await
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn query_failed(operation: &'static str) -> impl FnOnce(tokio_postgres::Error) -> CatalogError {
    move |err| {
        tracing::error!(operation, error = ?err, "Database query failed");
        CatalogError::from(StorageError::QueryFailed {
            operation: operation.to_string(),
            reason: err.to_string(),
        })
    }
}

fn invalid_row(err: impl std::fmt::Display) -> CatalogError {
    CatalogError::from(StorageError::InvalidRow {
        reason: err.to_string(),
    })
}

/// Map a row selected in the canonical column order to an album.
fn album_from_row(row: &Row) -> CatalogResult<Album> {
    let genre: Option<String> = row.try_get(5).map_err(invalid_row)?;
    let condition: Option<String> = row.try_get(6).map_err(invalid_row)?;
    let condition = match condition {
        Some(raw) => AlbumCondition::from_optional_str(&raw).map_err(invalid_row)?,
        None => None,
    };

    Ok(Album {
        id: row.try_get(0).map_err(invalid_row)?,
        title: row.try_get(1).map_err(invalid_row)?,
        artist: row.try_get(2).map_err(invalid_row)?,
        price: row.try_get(3).map_err(invalid_row)?,
        year: row.try_get(4).map_err(invalid_row)?,
        genre: genre.unwrap_or_default(),
        condition,
        in_stock: row.try_get(7).map_err(invalid_row)?,
        created_at: row.try_get(8).map_err(invalid_row)?,
        updated_at: row.try_get(9).map_err(invalid_row)?,
    })
}

fn observe<T>(operation: &str, started: Instant, result: &CatalogResult<T>) {
    // Not-found is an answer, not a failure.
    let success = match result {
        Ok(_) => true,
        Err(err) => err.is_not_found(),
    };
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_db_operation(operation, success, started.elapsed().as_secs_f64());
    }
}
