//! OpenAPI Specification for the Catalog API
//!
//! Generated with utoipa from the route annotations and schema derives.

use utoipa::OpenApi;

use catalog_core::{Album, AlbumCondition, AlbumInput};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{album, health};
use crate::telemetry::metrics;
use crate::types::ListAlbumsParams;

/// OpenAPI document for the catalog REST surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vintage Jazz Shop Catalog API",
        version = "0.3.0",
        description = "Record-album catalog with read-through caching",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Albums", description = "Catalog CRUD and queries"),
        (name = "Health", description = "Liveness and dependency checks"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        album::list_albums,
        album::list_in_stock,
        album::get_album,
        album::create_album,
        album::update_album,
        album::delete_album,
        album::list_by_artist,
        health::health,
        health::liveness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            ApiError, ErrorCode,
            Album, AlbumInput, AlbumCondition, ListAlbumsParams,
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth,
        )
    )
)]
pub struct ApiDoc;
