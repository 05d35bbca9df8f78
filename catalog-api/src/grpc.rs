//! gRPC Service Implementation
//!
//! Implements `CatalogService` from proto/catalog.proto on top of the same
//! `AlbumService` the REST handlers use, so both surfaces validate and map
//! errors identically.

use std::sync::Arc;

use catalog_core::{Album, AlbumCondition, AlbumInput};
use tonic::{Request, Response, Status};

use crate::{
    error::{ApiError, ErrorCode},
    services::AlbumService,
    telemetry::METRICS,
};

// Include the generated protobuf code
pub mod proto {
    tonic::include_proto!("catalog");
}

use proto::catalog_service_server::{CatalogService, CatalogServiceServer};

// ============================================================================
// ERROR CONVERSION
// ============================================================================

impl From<ApiError> for Status {
    fn from(err: ApiError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidFormat => Status::invalid_argument(err.message),
            ErrorCode::AlbumNotFound => Status::not_found(err.message),
            ErrorCode::ServiceUnavailable => Status::unavailable(err.message),
            ErrorCode::ConnectionPoolExhausted => Status::resource_exhausted(err.message),
            ErrorCode::InternalError | ErrorCode::DatabaseError => Status::internal(err.message),
        }
    }
}

fn to_status(err: catalog_core::CatalogError) -> Status {
    Status::from(ApiError::from(err))
}

/// Count the call outcome and hand the result back.
fn observe<T>(method: &str, result: Result<T, Status>) -> Result<T, Status> {
    if let Ok(metrics) = METRICS.as_ref() {
        let code = match &result {
            Ok(_) => tonic::Code::Ok,
            Err(status) => status.code(),
        };
        metrics.record_grpc_request(method, &format!("{:?}", code));
    }
    result
}

// ============================================================================
// CONVERSIONS
// ============================================================================

fn album_to_proto(album: Album) -> proto::Album {
    proto::Album {
        id: album.id,
        title: album.title,
        artist: album.artist,
        price: album.price,
        year: album.year,
        genre: album.genre,
        condition: album
            .condition
            .map(|c| c.as_db_str().to_string())
            .unwrap_or_default(),
        in_stock: album.in_stock,
        created_at: album.created_at.to_rfc3339(),
        updated_at: album.updated_at.to_rfc3339(),
    }
}

fn albums_to_proto(albums: Vec<Album>) -> Vec<proto::Album> {
    albums.into_iter().map(album_to_proto).collect()
}

fn parse_condition(value: &str) -> Result<Option<AlbumCondition>, Status> {
    AlbumCondition::from_optional_str(value).map_err(|_| {
        Status::from(ApiError::invalid_format(
            "condition",
            "one of mint, very good, good, fair, poor",
        ))
    })
}

fn build_input(
    title: String,
    artist: String,
    price: f64,
    year: i32,
    genre: String,
    condition: &str,
    in_stock: bool,
) -> Result<AlbumInput, Status> {
    Ok(AlbumInput {
        title,
        artist,
        price,
        year,
        genre,
        condition: parse_condition(condition)?,
        in_stock,
    })
}

/// Negative paging values are treated as zero.
fn to_page_arg(value: i32) -> Option<usize> {
    usize::try_from(value).ok().filter(|v| *v > 0)
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Clone)]
pub struct CatalogServiceImpl {
    service: Arc<AlbumService>,
}

impl CatalogServiceImpl {
    pub fn new(service: Arc<AlbumService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn get_albums(
        &self,
        request: Request<proto::GetAlbumsRequest>,
    ) -> Result<Response<proto::GetAlbumsResponse>, Status> {
        let req = request.into_inner();
        let result = self
            .service
            .list_albums(to_page_arg(req.limit), to_page_arg(req.offset))
            .await
            .map_err(to_status)
            .map(|(albums, total)| {
                Response::new(proto::GetAlbumsResponse {
                    albums: albums_to_proto(albums),
                    total_count: i32::try_from(total).unwrap_or(i32::MAX),
                })
            });
        observe("GetAlbums", result)
    }

    async fn get_album_by_id(
        &self,
        request: Request<proto::GetAlbumByIdRequest>,
    ) -> Result<Response<proto::GetAlbumByIdResponse>, Status> {
        let id = request.into_inner().id;
        let result = self
            .service
            .get_album_by_id(&id)
            .await
            .map_err(to_status)
            .map(|album| {
                Response::new(proto::GetAlbumByIdResponse {
                    album: Some(album_to_proto(album)),
                })
            });
        observe("GetAlbumById", result)
    }

    async fn create_album(
        &self,
        request: Request<proto::CreateAlbumRequest>,
    ) -> Result<Response<proto::CreateAlbumResponse>, Status> {
        let req = request.into_inner();
        let result: Result<_, Status> = async {
            let input = build_input(
                req.title,
                req.artist,
                req.price,
                req.year,
                req.genre,
                &req.condition,
                req.in_stock,
            )?;
            let album = self.service.create_album(input).await.map_err(to_status)?;
            Ok(Response::new(proto::CreateAlbumResponse {
                album: Some(album_to_proto(album)),
            }))
        }
        .await;
        observe("CreateAlbum", result)
    }

    async fn update_album(
        &self,
        request: Request<proto::UpdateAlbumRequest>,
    ) -> Result<Response<proto::UpdateAlbumResponse>, Status> {
        let req = request.into_inner();
        let result: Result<_, Status> = async {
            let input = build_input(
                req.title,
                req.artist,
                req.price,
                req.year,
                req.genre,
                &req.condition,
                req.in_stock,
            )?;
            let album = self
                .service
                .update_album(&req.id, input)
                .await
                .map_err(to_status)?;
            Ok(Response::new(proto::UpdateAlbumResponse {
                album: Some(album_to_proto(album)),
            }))
        }
        .await;
        observe("UpdateAlbum", result)
    }

    async fn delete_album(
        &self,
        request: Request<proto::DeleteAlbumRequest>,
    ) -> Result<Response<proto::DeleteAlbumResponse>, Status> {
        let id = request.into_inner().id;
        let result = self
            .service
            .delete_album(&id)
            .await
            .map_err(to_status)
            .map(|()| {
                Response::new(proto::DeleteAlbumResponse {
                    success: true,
                    message: format!("Album {} deleted", id),
                })
            });
        observe("DeleteAlbum", result)
    }

    async fn search_albums_by_artist(
        &self,
        request: Request<proto::SearchAlbumsByArtistRequest>,
    ) -> Result<Response<proto::SearchAlbumsByArtistResponse>, Status> {
        let artist = request.into_inner().artist;
        let result = self
            .service
            .get_albums_by_artist(&artist)
            .await
            .map_err(to_status)
            .map(|albums| {
                Response::new(proto::SearchAlbumsByArtistResponse {
                    albums: albums_to_proto(albums),
                })
            });
        observe("SearchAlbumsByArtist", result)
    }

    async fn get_albums_in_stock(
        &self,
        _request: Request<proto::GetAlbumsInStockRequest>,
    ) -> Result<Response<proto::GetAlbumsInStockResponse>, Status> {
        let result = self
            .service
            .get_albums_in_stock()
            .await
            .map_err(to_status)
            .map(|albums| {
                Response::new(proto::GetAlbumsInStockResponse {
                    albums: albums_to_proto(albums),
                })
            });
        observe("GetAlbumsInStock", result)
    }
}

/// Create the tonic service wrapper.
pub fn create_services(service: Arc<AlbumService>) -> CatalogServiceServer<CatalogServiceImpl> {
    CatalogServiceServer::new(CatalogServiceImpl::new(service))
}
