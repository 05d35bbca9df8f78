//! Service Layer
//!
//! Business rules that sit between the delivery adapters and the record
//! store. Services know nothing about caching; they are handed an
//! `Arc<dyn AlbumRepository>` and cannot tell what is behind it.

mod album_service;

pub use album_service::*;
