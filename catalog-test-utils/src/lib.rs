//! Catalog Test Utilities
//!
//! Shared test infrastructure for the catalog workspace:
//! - Proptest generators for album inputs
//! - Fixtures for the usual demo records
//! - Test doubles: a cache that fails on demand and a store that counts calls
//! - Assertions for the store ordering contract and error kinds

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

// Re-export the in-memory implementations from their source crate
pub use catalog_storage::{
    AlbumRepository, CacheBackend, CacheResult, InMemoryAlbumRepository, InMemoryCacheBackend,
};

// Re-export core types for convenience
pub use catalog_core::{
    Album, AlbumCondition, AlbumInput, CacheError, CatalogError, CatalogResult, StorageError,
    ValidationError,
};

/// Yield long enough for detached cache tasks to finish.
///
/// Works on the current-thread runtime used by `#[tokio::test]`; on a
/// multi-threaded runtime it also sleeps briefly.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    if tokio::runtime::Handle::current().runtime_flavor()
        == tokio::runtime::RuntimeFlavor::MultiThread
    {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ============================================================================
// TEST DOUBLES
// ============================================================================

/// In-memory cache that can be switched into a failing mode.
///
/// While failing, every operation returns `CacheError::Connection` without
/// touching the underlying entries.
#[derive(Debug, Default)]
pub struct FlakyCacheBackend {
    inner: InMemoryCacheBackend,
    failing: AtomicBool,
}

impl FlakyCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure mode.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The wrapped cache, for inspecting entries directly.
    pub fn inner(&self) -> &InMemoryCacheBackend {
        &self.inner
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Connection {
                reason: "simulated outage".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for FlakyCacheBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn ping(&self) -> CacheResult<()> {
        self.check()
    }
}

/// In-memory store that counts reads per operation.
#[derive(Debug, Default)]
pub struct RecordingRepository {
    inner: InMemoryAlbumRepository,
    get_all: AtomicUsize,
    get_by_id: AtomicUsize,
    get_by_artist: AtomicUsize,
    get_in_stock: AtomicUsize,
    writes: AtomicUsize,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store, for seeding without touching the counters.
    pub fn inner(&self) -> &InMemoryAlbumRepository {
        &self.inner
    }

    /// Total read calls across all read operations.
    pub fn reads(&self) -> usize {
        self.get_all.load(Ordering::SeqCst)
            + self.get_by_id.load(Ordering::SeqCst)
            + self.get_by_artist.load(Ordering::SeqCst)
            + self.get_in_stock.load(Ordering::SeqCst)
    }

    pub fn get_all_calls(&self) -> usize {
        self.get_all.load(Ordering::SeqCst)
    }

    pub fn get_by_id_calls(&self) -> usize {
        self.get_by_id.load(Ordering::SeqCst)
    }

    pub fn get_by_artist_calls(&self) -> usize {
        self.get_by_artist.load(Ordering::SeqCst)
    }

    pub fn get_in_stock_calls(&self) -> usize {
        self.get_in_stock.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlbumRepository for RecordingRepository {
    async fn get_all(&self) -> CatalogResult<Vec<Album>> {
        self.get_all.fetch_add(1, Ordering::SeqCst);
        self.inner.get_all().await
    }

    async fn get_by_id(&self, id: &str) -> CatalogResult<Album> {
        self.get_by_id.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id).await
    }

    async fn create(&self, input: AlbumInput) -> CatalogResult<Album> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create(input).await
    }

    async fn update(&self, album: Album) -> CatalogResult<Album> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(album).await
    }

    async fn delete(&self, id: &str) -> CatalogResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }

    async fn get_by_artist(&self, artist: &str) -> CatalogResult<Vec<Album>> {
        self.get_by_artist.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_artist(artist).await
    }

    async fn get_in_stock(&self) -> CatalogResult<Vec<Album>> {
        self.get_in_stock.fetch_add(1, Ordering::SeqCst);
        self.inner.get_in_stock().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating album inputs.

    use super::*;
    use proptest::prelude::*;

    /// Generate any condition grade, or none.
    pub fn arb_condition() -> impl Strategy<Value = Option<AlbumCondition>> {
        prop_oneof![
            Just(None),
            Just(Some(AlbumCondition::Mint)),
            Just(Some(AlbumCondition::VeryGood)),
            Just(Some(AlbumCondition::Good)),
            Just(Some(AlbumCondition::Fair)),
            Just(Some(AlbumCondition::Poor)),
        ]
    }

    /// Generate a plausible artist name.
    pub fn arb_artist() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("John Coltrane".to_string()),
            Just("Miles Davis".to_string()),
            Just("Dave Brubeck".to_string()),
            Just("Thelonious Monk".to_string()),
            "[A-Z][a-z]{2,10} [A-Z][a-z]{2,12}",
        ]
    }

    /// Generate a non-empty title.
    pub fn arb_title() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ']{0,30}"
    }

    /// Generate a non-negative price with cent precision.
    pub fn arb_price() -> impl Strategy<Value = f64> {
        (0u32..100_000).prop_map(|cents| cents as f64 / 100.0)
    }

    /// Generate an input that passes service validation.
    pub fn arb_album_input() -> impl Strategy<Value = AlbumInput> {
        (
            arb_title(),
            arb_artist(),
            arb_price(),
            1900i32..2030,
            "[A-Za-z ]{0,16}",
            arb_condition(),
            any::<bool>(),
        )
            .prop_map(
                |(title, artist, price, year, genre, condition, in_stock)| AlbumInput {
                    title,
                    artist,
                    price,
                    year,
                    genre,
                    condition,
                    in_stock,
                },
            )
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built album inputs for common scenarios.

    use super::*;

    /// Dave Brubeck, "Time Out" (1959).
    pub fn time_out_input() -> AlbumInput {
        AlbumInput {
            title: "Time Out".to_string(),
            artist: "Dave Brubeck".to_string(),
            price: 39.99,
            year: 1959,
            genre: "Cool Jazz".to_string(),
            condition: Some(AlbumCondition::VeryGood),
            in_stock: true,
        }
    }

    /// Miles Davis, "Kind of Blue" (1959).
    pub fn kind_of_blue_input() -> AlbumInput {
        AlbumInput {
            title: "Kind of Blue".to_string(),
            artist: "Miles Davis".to_string(),
            price: 29.99,
            year: 1959,
            genre: "Modal Jazz".to_string(),
            condition: Some(AlbumCondition::Mint),
            in_stock: true,
        }
    }

    /// John Coltrane, "A Love Supreme" (1965), out of stock.
    pub fn a_love_supreme_input() -> AlbumInput {
        AlbumInput {
            title: "A Love Supreme".to_string(),
            artist: "John Coltrane".to_string(),
            price: 49.5,
            year: 1965,
            genre: "Spiritual Jazz".to_string(),
            condition: Some(AlbumCondition::Good),
            in_stock: false,
        }
    }

    /// John Coltrane, "Blue Train" (1957).
    pub fn blue_train_input() -> AlbumInput {
        AlbumInput {
            title: "Blue Train".to_string(),
            artist: "John Coltrane".to_string(),
            price: 56.99,
            year: 1957,
            genre: "Hard Bop".to_string(),
            condition: Some(AlbumCondition::Mint),
            in_stock: true,
        }
    }

    /// A small mixed catalog.
    pub fn sample_catalog() -> Vec<AlbumInput> {
        vec![
            time_out_input(),
            kind_of_blue_input(),
            a_love_supreme_input(),
            blue_train_input(),
        ]
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for catalog-specific validation.

    use super::*;

    /// Assert that a stored album carries exactly the given input fields.
    #[track_caller]
    pub fn assert_matches_input(album: &Album, input: &AlbumInput) {
        assert_eq!(&album.to_input(), input, "stored fields differ from input");
    }

    /// Assert newest `created_at` first.
    #[track_caller]
    pub fn assert_newest_first(albums: &[Album]) {
        for pair in albums.windows(2) {
            assert!(
                pair[0].created_at >= pair[1].created_at,
                "albums not ordered newest first: {} before {}",
                pair[0].id,
                pair[1].id
            );
        }
    }

    /// Assert highest `year` first.
    #[track_caller]
    pub fn assert_year_desc(albums: &[Album]) {
        for pair in albums.windows(2) {
            assert!(
                pair[0].year >= pair[1].year,
                "albums not ordered by year: {} ({}) before {} ({})",
                pair[0].id,
                pair[0].year,
                pair[1].id,
                pair[1].year
            );
        }
    }

    /// Assert that a result is a not-found storage error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &CatalogResult<T>) {
        match result {
            Err(CatalogError::Storage(StorageError::NotFound { .. })) => {}
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    /// Assert that a result is a validation error naming `field`.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &CatalogResult<T>, field: &str) {
        match result {
            Err(CatalogError::Validation(ValidationError::RequiredFieldMissing { field: f }))
            | Err(CatalogError::Validation(ValidationError::InvalidValue { field: f, .. })) => {
                assert_eq!(f, field, "validation error names the wrong field");
            }
            other => panic!("Expected Validation error for {}, got: {:?}", field, other),
        }
    }
}
