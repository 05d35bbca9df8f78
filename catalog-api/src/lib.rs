//! Catalog API - REST/gRPC Delivery Layer
//!
//! Exposes the record-album catalog over REST (Axum) and, with the `grpc`
//! feature, gRPC (Tonic). Both surfaces share one `AlbumService`, which sits
//! on a Postgres or in-memory record store with an optional Redis or
//! in-memory cache in front.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
#[cfg(feature = "grpc")]
pub mod grpc;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use app::build_state;
pub use config::{ApiConfig, CacheKind, RedisConfig, StoreKind};
pub use db::{DbClient, DbConfig, PostgresAlbumRepository};
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "grpc")]
pub use grpc::{create_services, proto};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::AlbumService;
pub use state::AppState;
pub use types::*;
