//! Album entity and its caller-controlled input subset.

use serde::{Deserialize, Serialize};

use crate::{AlbumCondition, AlbumId, Timestamp};

/// A record album held in the catalog.
///
/// `id`, `created_at` and `updated_at` are owned by the record store:
/// the id and both timestamps are assigned on insert, `created_at` never
/// changes afterwards and `updated_at` is refreshed on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Album {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub price: f64,
    pub year: i32,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub condition: Option<AlbumCondition>,
    #[serde(default)]
    pub in_stock: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = DateTime))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = DateTime))]
    pub updated_at: Timestamp,
}

impl Album {
    /// Materialize a stored record from caller input.
    ///
    /// Both timestamps are set to `now`.
    pub fn from_input(id: AlbumId, input: AlbumInput, now: Timestamp) -> Self {
        Self {
            id,
            title: input.title,
            artist: input.artist,
            price: input.price,
            year: input.year,
            genre: input.genre,
            condition: input.condition,
            in_stock: input.in_stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every caller-controlled field, keeping identity and timestamps.
    pub fn apply(mut self, input: AlbumInput) -> Self {
        self.title = input.title;
        self.artist = input.artist;
        self.price = input.price;
        self.year = input.year;
        self.genre = input.genre;
        self.condition = input.condition;
        self.in_stock = input.in_stock;
        self
    }

    /// The caller-controlled subset of this record.
    pub fn to_input(&self) -> AlbumInput {
        AlbumInput {
            title: self.title.clone(),
            artist: self.artist.clone(),
            price: self.price,
            year: self.year,
            genre: self.genre.clone(),
            condition: self.condition,
            in_stock: self.in_stock,
        }
    }
}

/// Fields a caller may set when creating or replacing an album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlbumInput {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub price: f64,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub condition: Option<AlbumCondition>,
    #[serde(default)]
    pub in_stock: bool,
}
