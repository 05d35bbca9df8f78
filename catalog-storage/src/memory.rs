//! In-memory album store.
//!
//! An arena of records behind a reader/writer lock. Reads take the shared
//! lock and writes the exclusive one. Arena order carries no meaning; every
//! list query sorts its result before returning.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use catalog_core::{
    new_album_id, Album, AlbumCondition, AlbumInput, CatalogError, CatalogResult, StorageError,
};
use chrono::Utc;

use crate::{sort_by_year_desc, sort_newest_first, AlbumRepository};

/// Process-local album store.
#[derive(Debug, Default)]
pub struct InMemoryAlbumRepository {
    albums: RwLock<Vec<Album>>,
}

impl InMemoryAlbumRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given records.
    pub fn with_albums(albums: Vec<Album>) -> Self {
        Self {
            albums: RwLock::new(albums),
        }
    }

    /// Create a store holding a single demo record, for local development.
    pub fn seeded() -> Self {
        let input = AlbumInput {
            title: "Blue Train".to_string(),
            artist: "John Coltrane".to_string(),
            price: 56.99,
            year: 1957,
            genre: "Hard Bop".to_string(),
            condition: Some(AlbumCondition::Mint),
            in_stock: true,
        };
        Self::with_albums(vec![Album::from_input(new_album_id(), input, Utc::now())])
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.read().map(|albums| albums.len()).unwrap_or(0)
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> CatalogResult<RwLockReadGuard<'_, Vec<Album>>> {
        self.albums
            .read()
            .map_err(|_| CatalogError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> CatalogResult<RwLockWriteGuard<'_, Vec<Album>>> {
        self.albums
            .write()
            .map_err(|_| CatalogError::Storage(StorageError::LockPoisoned))
    }

    fn filtered(&self, predicate: impl Fn(&Album) -> bool) -> CatalogResult<Vec<Album>> {
        let albums = self.read()?;
        Ok(albums.iter().filter(|a| predicate(a)).cloned().collect())
    }
}

#[async_trait]
impl AlbumRepository for InMemoryAlbumRepository {
    async fn get_all(&self) -> CatalogResult<Vec<Album>> {
        let mut albums = self.filtered(|_| true)?;
        sort_newest_first(&mut albums);
        Ok(albums)
    }

    async fn get_by_id(&self, id: &str) -> CatalogResult<Album> {
        let albums = self.read()?;
        albums
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(id))
    }

    async fn create(&self, input: AlbumInput) -> CatalogResult<Album> {
        let album = Album::from_input(new_album_id(), input, Utc::now());
        self.write()?.push(album.clone());
        tracing::debug!(id = %album.id, "album stored in memory");
        Ok(album)
    }

    async fn update(&self, album: Album) -> CatalogResult<Album> {
        let mut albums = self.write()?;
        let slot = albums
            .iter_mut()
            .find(|a| a.id == album.id)
            .ok_or_else(|| CatalogError::not_found(album.id.as_str()))?;

        let mut updated = slot.clone().apply(album.to_input());
        updated.updated_at = Utc::now();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> CatalogResult<()> {
        let mut albums = self.write()?;
        let index = albums
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| CatalogError::not_found(id))?;
        // Order is not meaningful, so the cheaper removal is fine.
        albums.swap_remove(index);
        Ok(())
    }

    async fn get_by_artist(&self, artist: &str) -> CatalogResult<Vec<Album>> {
        let mut albums = self.filtered(|a| a.artist == artist)?;
        sort_by_year_desc(&mut albums);
        Ok(albums)
    }

    async fn get_in_stock(&self) -> CatalogResult<Vec<Album>> {
        let mut albums = self.filtered(|a| a.in_stock)?;
        sort_newest_first(&mut albums);
        Ok(albums)
    }
}
