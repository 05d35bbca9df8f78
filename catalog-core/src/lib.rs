//! Catalog Core - Entity Types
//!
//! Pure data structures shared by every other crate: the album record, its
//! mutable input subset, the condition grading enum, and the error taxonomy.
//! This crate contains no I/O.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod entities;
pub mod enums;
pub mod error;

pub use entities::{Album, AlbumInput};
pub use enums::{AlbumCondition, AlbumConditionParseError};
pub use error::{CacheError, CatalogError, CatalogResult, StorageError, ValidationError};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Opaque album identifier as exposed over the wire.
pub type AlbumId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new album identifier.
///
/// UUIDv7 embeds a Unix timestamp, so identifiers sort by creation time.
pub fn new_album_id() -> AlbumId {
    Uuid::now_v7().to_string()
}
