//! Shared application state for Axum routers.

use std::sync::Arc;

use crate::routes::health::HealthState;
use crate::services::AlbumService;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Album operations, already wired to the configured store and cache.
    pub service: Arc<AlbumService>,
    /// Handles probed by the health endpoint.
    pub health: Arc<HealthState>,
}

impl AppState {
    pub fn new(service: Arc<AlbumService>, health: Arc<HealthState>) -> Self {
        Self { service, health }
    }
}

crate::impl_from_ref!(Arc<AlbumService>, service);
crate::impl_from_ref!(Arc<HealthState>, health);
