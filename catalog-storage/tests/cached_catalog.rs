//! End-to-end behavior of the cached store against the in-memory variants.

use std::sync::Arc;
use std::time::Duration;

use catalog_storage::{
    AlbumRepository, CacheBackend, CacheCategory, CacheConfig, CachedAlbumRepository,
    InMemoryCacheBackend,
};
use catalog_test_utils::assertions::{
    assert_matches_input, assert_newest_first, assert_not_found, assert_year_desc,
};
use catalog_test_utils::fixtures::{
    a_love_supreme_input, blue_train_input, kind_of_blue_input, time_out_input,
};
use catalog_test_utils::generators::arb_album_input;
use catalog_test_utils::{settle, FlakyCacheBackend, RecordingRepository};
use proptest::prelude::*;

fn cached(
    store: &Arc<RecordingRepository>,
    cache: &Arc<InMemoryCacheBackend>,
) -> CachedAlbumRepository<RecordingRepository, InMemoryCacheBackend> {
    CachedAlbumRepository::with_defaults(Arc::clone(store), Arc::clone(cache))
}

#[tokio::test]
async fn test_brubeck_lifecycle() {
    let store = Arc::new(RecordingRepository::new());
    let cache = Arc::new(InMemoryCacheBackend::new());
    let repo = cached(&store, &cache);

    let created = repo.create(time_out_input()).await.unwrap();
    assert!(!created.id.is_empty());
    assert_matches_input(&created, &time_out_input());
    settle().await;

    // Warmed by create: served without touching the store.
    let before = store.get_by_id_calls();
    let fetched = repo.get_by_id(&created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(store.get_by_id_calls(), before);

    let by_artist = repo.get_by_artist("Dave Brubeck").await.unwrap();
    assert_eq!(by_artist.len(), 1);
    settle().await;

    let mut changed = created.clone();
    changed.price = 34.99;
    let updated = repo.update(changed).await.unwrap();
    assert_eq!(updated.price, 34.99);
    assert_eq!(updated.created_at, created.created_at);
    settle().await;

    let after_update = repo.get_by_id(&created.id).await.unwrap();
    assert_eq!(after_update.price, 34.99);
    let by_artist = repo.get_by_artist("Dave Brubeck").await.unwrap();
    assert_eq!(by_artist[0].price, 34.99);

    repo.delete(&created.id).await.unwrap();
    settle().await;

    assert_not_found(&repo.get_by_id(&created.id).await);
    assert!(repo.get_by_artist("Dave Brubeck").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_artist_move_clears_both_lists() {
    let store = Arc::new(RecordingRepository::new());
    let cache = Arc::new(InMemoryCacheBackend::new());
    let repo = cached(&store, &cache);

    let album = repo.create(a_love_supreme_input()).await.unwrap();
    repo.create(blue_train_input()).await.unwrap();
    settle().await;

    assert_eq!(repo.get_by_artist("John Coltrane").await.unwrap().len(), 2);
    assert!(repo.get_by_artist("Alice Coltrane").await.unwrap().is_empty());
    settle().await;

    let mut moved = album.clone();
    moved.artist = "Alice Coltrane".to_string();
    repo.update(moved).await.unwrap();
    settle().await;

    let john = repo.get_by_artist("John Coltrane").await.unwrap();
    let alice = repo.get_by_artist("Alice Coltrane").await.unwrap();
    assert_eq!(john.len(), 1);
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].id, album.id);
}

#[tokio::test]
async fn test_list_orderings_survive_caching() {
    let store = Arc::new(RecordingRepository::new());
    let cache = Arc::new(InMemoryCacheBackend::new());
    let repo = cached(&store, &cache);

    for input in [blue_train_input(), a_love_supreme_input(), kind_of_blue_input()] {
        repo.create(input).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    settle().await;

    let cold = repo.get_all().await.unwrap();
    settle().await;
    let warm = repo.get_all().await.unwrap();
    assert_eq!(cold, warm);
    assert_newest_first(&warm);
    assert_eq!(store.get_all_calls(), 1);

    let coltrane = repo.get_by_artist("John Coltrane").await.unwrap();
    assert_year_desc(&coltrane);
    assert_eq!(coltrane[0].title, "A Love Supreme");

    let stock = repo.get_in_stock().await.unwrap();
    assert!(stock.iter().all(|a| a.in_stock));
    assert_newest_first(&stock);
}

#[tokio::test]
async fn test_outage_falls_back_to_store() {
    let store = Arc::new(RecordingRepository::new());
    let cache = Arc::new(FlakyCacheBackend::new());
    let repo = CachedAlbumRepository::with_defaults(Arc::clone(&store), Arc::clone(&cache));

    let album = repo.create(kind_of_blue_input()).await.unwrap();
    settle().await;

    cache.set_failing(true);
    let fetched = repo.get_by_id(&album.id).await.unwrap();
    assert_eq!(fetched.id, album.id);
    assert!(store.get_by_id_calls() >= 1);

    // Writes still succeed while the cache is down.
    repo.delete(&album.id).await.unwrap();
    settle().await;

    // The id entry warmed before the outage survived the failed invalidation;
    // it is bounded by its TTL.
    cache.set_failing(false);
    assert!(cache
        .inner()
        .contains(&CacheConfig::default().key(CacheCategory::Id, &album.id)));
    assert!(cache.ping().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_stale_list_expires_after_ttl() {
    let store = Arc::new(RecordingRepository::new());
    let cache = Arc::new(InMemoryCacheBackend::new());
    let config = CacheConfig::default().with_ttl(CacheCategory::All, Duration::from_secs(60));
    let repo = CachedAlbumRepository::new(Arc::clone(&store), Arc::clone(&cache), config);

    repo.create(time_out_input()).await.unwrap();
    settle().await;
    assert_eq!(repo.get_all().await.unwrap().len(), 1);
    settle().await;

    // A second record does not clear the cached list.
    repo.create(kind_of_blue_input()).await.unwrap();
    settle().await;
    assert_eq!(repo.get_all().await.unwrap().len(), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(repo.get_all().await.unwrap().len(), 2);
    assert_eq!(store.get_all_calls(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_create_then_get_returns_same_fields(input in arb_album_input()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = Arc::new(RecordingRepository::new());
            let cache = Arc::new(InMemoryCacheBackend::new());
            let repo = cached(&store, &cache);

            let created = repo.create(input.clone()).await.unwrap();
            settle().await;
            let fetched = repo.get_by_id(&created.id).await.unwrap();
            assert_eq!(fetched.to_input(), input);
            assert_eq!(fetched.id, created.id);
        });
    }
}
