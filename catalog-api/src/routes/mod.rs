//! REST API Routes Module
//!
//! Includes:
//! - Album CRUD and query routes
//! - Health check endpoints
//! - Prometheus metrics and the OpenAPI document
//! - CORS support for browser-based clients

pub mod album;
pub mod health;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};
use crate::types::TOTAL_COUNT_HEADER;

/// Handler for /openapi.json endpoint when Swagger UI is not serving it.
#[cfg(all(feature = "openapi", not(feature = "swagger-ui")))]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

/// Build CORS layer from configuration.
///
/// In development (no origins configured), allows all origins.
/// In production, only allows the configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any).expose_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .expose_headers([HeaderName::from_static(TOTAL_COUNT_HEADER)])
    }
}

/// Create the complete REST router.
///
/// - Album routes at /albums and /artists/:artist/albums
/// - Health checks at /health and /health/live
/// - Metrics at /metrics
/// - OpenAPI spec at /openapi.json (openapi feature)
/// - Swagger UI at /swagger-ui (swagger-ui feature)
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let mut router = Router::new()
        .merge(album::create_router())
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler));

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/openapi.json", crate::openapi::ApiDoc::openapi()),
        );
    }

    #[cfg(all(feature = "openapi", not(feature = "swagger-ui")))]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }

    let cors = build_cors_layer(api_config);

    router
        .layer(from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}
