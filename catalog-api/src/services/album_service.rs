//! Album Service
//!
//! Input validation and domain rules for album operations. Every failed
//! check returns before the repository is touched.

use std::sync::Arc;

use catalog_core::{Album, AlbumInput, CatalogError, CatalogResult, ValidationError};
use catalog_storage::AlbumRepository;

/// Catalog operations exposed to REST and gRPC handlers.
#[derive(Clone)]
pub struct AlbumService {
    repo: Arc<dyn AlbumRepository>,
}

impl AlbumService {
    pub fn new(repo: Arc<dyn AlbumRepository>) -> Self {
        Self { repo }
    }

    /// The repository this service delegates to.
    pub fn repository(&self) -> &Arc<dyn AlbumRepository> {
        &self.repo
    }

    /// All albums, newest first.
    pub async fn get_all_albums(&self) -> CatalogResult<Vec<Album>> {
        self.repo.get_all().await
    }

    /// One page of the full listing plus the total number of albums.
    ///
    /// `limit` of `None` or zero returns everything from `offset` on. An
    /// offset past the end yields an empty page.
    pub async fn list_albums(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> CatalogResult<(Vec<Album>, usize)> {
        let albums = self.repo.get_all().await?;
        let total = albums.len();
        let offset = offset.unwrap_or(0).min(total);
        let page: Vec<Album> = match limit {
            Some(limit) if limit > 0 => albums.into_iter().skip(offset).take(limit).collect(),
            _ => albums.into_iter().skip(offset).collect(),
        };
        Ok((page, total))
    }

    pub async fn get_album_by_id(&self, id: &str) -> CatalogResult<Album> {
        validate_id(id)?;
        self.repo.get_by_id(id).await
    }

    /// Validate and insert a new album.
    pub async fn create_album(&self, input: AlbumInput) -> CatalogResult<Album> {
        validate_input(&input)?;
        let album = self.repo.create(input).await?;
        tracing::info!(album_id = %album.id, artist = %album.artist, "Album created");
        Ok(album)
    }

    /// Replace the caller-controlled fields of an existing album.
    ///
    /// The existing record is loaded first so a missing id surfaces as
    /// not-found and the stored `created_at` carries over.
    pub async fn update_album(&self, id: &str, input: AlbumInput) -> CatalogResult<Album> {
        validate_id(id)?;
        validate_input(&input)?;

        let existing = self.repo.get_by_id(id).await?;
        let album = self.repo.update(existing.apply(input)).await?;
        tracing::info!(album_id = %album.id, "Album updated");
        Ok(album)
    }

    pub async fn delete_album(&self, id: &str) -> CatalogResult<()> {
        validate_id(id)?;
        self.repo.delete(id).await?;
        tracing::info!(album_id = %id, "Album deleted");
        Ok(())
    }

    /// Albums by exact artist name, highest year first.
    pub async fn get_albums_by_artist(&self, artist: &str) -> CatalogResult<Vec<Album>> {
        if artist.trim().is_empty() {
            return Err(missing("artist"));
        }
        self.repo.get_by_artist(artist).await
    }

    /// Albums currently in stock, newest first.
    pub async fn get_albums_in_stock(&self) -> CatalogResult<Vec<Album>> {
        self.repo.get_in_stock().await
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn missing(field: &str) -> CatalogError {
    ValidationError::RequiredFieldMissing {
        field: field.to_string(),
    }
    .into()
}

fn validate_id(id: &str) -> CatalogResult<()> {
    if id.trim().is_empty() {
        return Err(missing("id"));
    }
    Ok(())
}

/// Check the fields every create and update must satisfy.
pub fn validate_input(input: &AlbumInput) -> CatalogResult<()> {
    if input.title.trim().is_empty() {
        return Err(missing("title"));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "price".to_string(),
            reason: format!("must be a non-negative finite number, got {}", input.price),
        }
        .into());
    }
    Ok(())
}
