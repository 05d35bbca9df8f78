//! Error types for catalog operations

use std::time::Duration;
use thiserror::Error;

/// Record store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Album not found: {id}")]
    NotFound { id: String },

    #[error("Query failed during {operation}: {reason}")]
    QueryFailed { operation: String, reason: String },

    #[error("Store connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Invalid row: {reason}")]
    InvalidRow { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Cache backend errors.
///
/// These never escape the caching decorator; they exist so backends can
/// report what went wrong for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend {backend} failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("Cache {operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Cache payload could not be (de)serialized: {reason}")]
    Serialization { reason: String },

    #[error("Cache connection failed: {reason}")]
    Connection { reason: String },
}

/// Master error type for all catalog errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl CatalogError {
    /// Shorthand for a not-found storage error.
    pub fn not_found(id: impl Into<String>) -> Self {
        CatalogError::Storage(StorageError::NotFound { id: id.into() })
    }

    /// True when the target record does not exist in the store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Storage(StorageError::NotFound { .. }))
    }

    /// True when the input was rejected before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// TESTS
// =============================================================================
