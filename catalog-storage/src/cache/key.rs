//! Cache key derivation.
//!
//! Keys have the shape `{prefix}:{category}:{discriminator}`. The prefix and
//! category tag never contain the separator (`CacheConfig::with_key_prefix`
//! strips it), so for a fixed prefix two keys
//! are equal only when category and discriminator are both equal.

use std::fmt;

/// The query shape a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// The full album list (no discriminator).
    All,
    /// A single album, discriminated by id.
    Id,
    /// Albums by one artist, discriminated by artist name.
    Artist,
    /// The in-stock list (no discriminator).
    Stock,
}

impl CacheCategory {
    /// Tag used inside the cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::All => "all",
            CacheCategory::Id => "id",
            CacheCategory::Artist => "artist",
            CacheCategory::Stock => "stock",
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Separator between key segments.
pub const KEY_SEPARATOR: char = ':';

/// Build the cache key for a category and discriminator.
pub fn build_cache_key(prefix: &str, category: CacheCategory, discriminator: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        prefix,
        category.as_str(),
        discriminator,
        sep = KEY_SEPARATOR
    )
}
