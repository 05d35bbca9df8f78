//! Album REST API Routes
//!
//! Axum handlers for catalog operations. Each handler validates through
//! `AlbumService` and lets `ApiError` pick the status code.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use catalog_core::AlbumInput;

#[cfg(feature = "openapi")]
use catalog_core::Album;

#[cfg(feature = "openapi")]
use crate::error::ApiError;
use crate::{
    error::ApiResult,
    services::AlbumService,
    state::AppState,
    types::{ListAlbumsParams, TOTAL_COUNT_HEADER},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /albums - List albums, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/albums",
    tag = "Albums",
    params(ListAlbumsParams),
    responses(
        (status = 200, description = "Albums, newest first", body = Vec<Album>,
            headers(("x-total-count" = usize, description = "Number of albums before paging"))),
        (status = 500, description = "Internal server error", body = ApiError),
    ),
))]
pub async fn list_albums(
    State(service): State<Arc<AlbumService>>,
    Query(params): Query<ListAlbumsParams>,
) -> ApiResult<impl IntoResponse> {
    let (albums, total) = service.list_albums(params.limit, params.offset).await?;

    Ok((
        [(HeaderName::from_static(TOTAL_COUNT_HEADER), total.to_string())],
        Json(albums),
    ))
}

/// GET /albums/stock - Albums currently in stock
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/albums/stock",
    tag = "Albums",
    responses(
        (status = 200, description = "In-stock albums, newest first", body = Vec<Album>),
        (status = 500, description = "Internal server error", body = ApiError),
    ),
))]
pub async fn list_in_stock(
    State(service): State<Arc<AlbumService>>,
) -> ApiResult<impl IntoResponse> {
    let albums = service.get_albums_in_stock().await?;
    Ok(Json(albums))
}

/// GET /albums/{id} - Get one album
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/albums/{id}",
    tag = "Albums",
    params(("id" = String, Path, description = "Album ID")),
    responses(
        (status = 200, description = "Album details", body = Album),
        (status = 404, description = "Album not found", body = ApiError),
    ),
))]
pub async fn get_album(
    State(service): State<Arc<AlbumService>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let album = service.get_album_by_id(&id).await?;
    Ok(Json(album))
}

/// POST /albums - Create an album
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/albums",
    tag = "Albums",
    request_body = AlbumInput,
    responses(
        (status = 201, description = "Album created", body = Album),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
))]
pub async fn create_album(
    State(service): State<Arc<AlbumService>>,
    Json(input): Json<AlbumInput>,
) -> ApiResult<impl IntoResponse> {
    let album = service.create_album(input).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

/// PUT /albums/{id} - Replace an album's fields
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/albums/{id}",
    tag = "Albums",
    params(("id" = String, Path, description = "Album ID")),
    request_body = AlbumInput,
    responses(
        (status = 200, description = "Album updated", body = Album),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Album not found", body = ApiError),
    ),
))]
pub async fn update_album(
    State(service): State<Arc<AlbumService>>,
    Path(id): Path<String>,
    Json(input): Json<AlbumInput>,
) -> ApiResult<impl IntoResponse> {
    let album = service.update_album(&id, input).await?;
    Ok(Json(album))
}

/// DELETE /albums/{id} - Remove an album
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/albums/{id}",
    tag = "Albums",
    params(("id" = String, Path, description = "Album ID")),
    responses(
        (status = 204, description = "Album deleted"),
        (status = 404, description = "Album not found", body = ApiError),
    ),
))]
pub async fn delete_album(
    State(service): State<Arc<AlbumService>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    service.delete_album(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /artists/{artist}/albums - Albums by artist, newest year first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/artists/{artist}/albums",
    tag = "Albums",
    params(("artist" = String, Path, description = "Exact artist name")),
    responses(
        (status = 200, description = "Albums by the artist", body = Vec<Album>),
        (status = 400, description = "Blank artist", body = ApiError),
    ),
))]
pub async fn list_by_artist(
    State(service): State<Arc<AlbumService>>,
    Path(artist): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let albums = service.get_albums_by_artist(&artist).await?;
    Ok(Json(albums))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Album routes. State is supplied by the caller.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/albums", get(list_albums).post(create_album))
        .route("/albums/stock", get(list_in_stock))
        .route(
            "/albums/:id",
            get(get_album).put(update_album).delete(delete_album),
        )
        .route("/artists/:artist/albums", get(list_by_artist))
}
