//! Health Check Endpoints
//!
//! - /health - Store and cache connectivity with per-component latency
//! - /health/live - Process alive check
//!
//! A down store makes the service unhealthy (503). A down cache only
//! degrades it, because every read falls back to the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use catalog_storage::CacheBackend;
use serde::{Deserialize, Serialize};

use crate::db::DbClient;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthDetails {
    pub service: String,
    /// Record store backend name
    pub store: String,
    /// Absent when the store is in-memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<ComponentHealth>,
    /// Absent when caching is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<ComponentHealth>,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn healthy(backend: Option<String>, latency_ms: u64) -> Self {
        Self {
            status: HealthStatus::Healthy,
            backend,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn failed(status: HealthStatus, backend: Option<String>, error: String) -> Self {
        Self {
            status,
            backend,
            latency_ms: None,
            error: Some(error),
        }
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Handles the health endpoint probes.
#[derive(Clone)]
pub struct HealthState {
    pub service_name: String,
    pub store: String,
    pub db: Option<DbClient>,
    pub cache: Option<Arc<dyn CacheBackend>>,
    pub cache_timeout: Duration,
    pub start_time: Instant,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            store: store.into(),
            db: None,
            cache: None,
            cache_timeout: Duration::from_secs(2),
            start_time: Instant::now(),
        }
    }

    pub fn with_db(mut self, db: DbClient) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheBackend>, timeout: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_timeout = timeout;
        self
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/live - Process liveness check
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse),
    ),
))]
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health - Store and cache connectivity
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Record store unreachable", body = HealthResponse),
    ),
))]
pub async fn health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let database = match &state.db {
        Some(db) => Some(check_database(db).await),
        None => None,
    };
    let cache = match &state.cache {
        Some(cache) => Some(check_cache(cache.as_ref(), state.cache_timeout).await),
        None => None,
    };

    let overall_status = overall(database.as_ref(), cache.as_ref());

    let response = HealthResponse {
        status: overall_status,
        message: None,
        details: Some(HealthDetails {
            service: state.service_name.clone(),
            store: state.store.clone(),
            database,
            cache,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

fn overall(database: Option<&ComponentHealth>, cache: Option<&ComponentHealth>) -> HealthStatus {
    if database.is_some_and(|db| db.status != HealthStatus::Healthy) {
        HealthStatus::Unhealthy
    } else if cache.is_some_and(|c| c.status != HealthStatus::Healthy) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

async fn check_database(db: &DbClient) -> ComponentHealth {
    let start = Instant::now();
    match db.health_check().await {
        Ok(()) => ComponentHealth::healthy(None, start.elapsed().as_millis() as u64),
        Err(e) => ComponentHealth::failed(
            HealthStatus::Unhealthy,
            None,
            format!("Database check failed: {}", e.message),
        ),
    }
}

async fn check_cache(cache: &dyn CacheBackend, timeout: Duration) -> ComponentHealth {
    let backend = Some(cache.name().to_string());
    let start = Instant::now();
    match tokio::time::timeout(timeout, cache.ping()).await {
        Ok(Ok(())) => ComponentHealth::healthy(backend, start.elapsed().as_millis() as u64),
        Ok(Err(e)) => ComponentHealth::failed(HealthStatus::Degraded, backend, e.to_string()),
        Err(_) => ComponentHealth::failed(
            HealthStatus::Degraded,
            backend,
            format!("Cache ping timed out after {:?}", timeout),
        ),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/live", get(liveness))
}
