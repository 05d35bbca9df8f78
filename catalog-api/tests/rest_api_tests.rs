//! REST surface tests
//!
//! Drives the full router (middleware, CORS, error mapping) with
//! `tower::ServiceExt::oneshot` against in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use catalog_api::{
    app::with_cache, create_api_router, routes::health::HealthState, AlbumService, ApiConfig,
    AppState, DbClient, DbConfig, TOTAL_COUNT_HEADER,
};
use catalog_storage::{AlbumRepository, CacheBackend, CacheConfig};
use catalog_test_utils::{
    fixtures::{kind_of_blue_input, time_out_input},
    settle, FlakyCacheBackend, InMemoryAlbumRepository, InMemoryCacheBackend, RecordingRepository,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// HELPERS
// ============================================================================

fn router_with(store: Arc<dyn AlbumRepository>, cache: Arc<dyn CacheBackend>) -> Router {
    let repo = with_cache(store, cache.clone(), CacheConfig::default());
    let health = HealthState::new("vintage-jazz-shop", "memory")
        .with_cache(cache, Duration::from_millis(200));
    let state = AppState::new(Arc::new(AlbumService::new(repo)), Arc::new(health));
    create_api_router(state, &ApiConfig::default())
}

fn memory_router() -> Router {
    router_with(
        Arc::new(InMemoryAlbumRepository::new()),
        Arc::new(InMemoryCacheBackend::new()),
    )
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, headers, value)
}

fn input_json(input: &catalog_test_utils::AlbumInput) -> Value {
    serde_json::to_value(input).unwrap()
}

// ============================================================================
// ALBUM ROUTES
// ============================================================================

#[tokio::test]
async fn test_brubeck_lifecycle_over_http() {
    let app = memory_router();

    let (status, _, created) =
        send(&app, Method::POST, "/albums", Some(input_json(&time_out_input()))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["created_at"], created["updated_at"]);
    settle().await;

    let (status, _, fetched) = send(&app, Method::GET, &format!("/albums/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _, by_artist) =
        send(&app, Method::GET, "/artists/Dave%20Brubeck/albums", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(by_artist
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["id"] == created["id"]));

    tokio::time::sleep(Duration::from_millis(5)).await;
    let mut repriced = time_out_input();
    repriced.price = 45.0;
    let (status, _, updated) = send(
        &app,
        Method::PUT,
        &format!("/albums/{}", id),
        Some(input_json(&repriced)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["created_at"], created["created_at"]);
    settle().await;

    let (_, _, fetched) = send(&app, Method::GET, &format!("/albums/{}", id), None).await;
    assert_eq!(fetched["price"], json!(45.0));
    let created_at: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(fetched["created_at"].clone()).unwrap();
    let updated_at: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(fetched["updated_at"].clone()).unwrap();
    assert!(updated_at > created_at);

    let (status, _, body) = send(&app, Method::DELETE, &format!("/albums/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    settle().await;

    let (status, _, body) = send(&app, Method::GET, &format!("/albums/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ALBUM_NOT_FOUND");
}

#[tokio::test]
async fn test_validation_errors_are_bad_request() {
    let app = memory_router();

    let mut untitled = time_out_input();
    untitled.title = "  ".to_string();
    let (status, _, body) = send(&app, Method::POST, "/albums", Some(input_json(&untitled))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
    assert_eq!(body["details"]["field"], "title");

    let mut negative = time_out_input();
    negative.price = -1.0;
    let (status, _, body) = send(&app, Method::POST, "/albums", Some(input_json(&negative))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "price");

    let (_, headers, _) = send(&app, Method::GET, "/albums", None).await;
    assert_eq!(headers[TOTAL_COUNT_HEADER], "0");
}

#[tokio::test]
async fn test_missing_album_is_not_found_for_every_verb() {
    let app = memory_router();
    let uri = "/albums/does-not-exist";

    let (status, _, _) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) =
        send(&app, Method::PUT, uri, Some(input_json(&time_out_input()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, Method::DELETE, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_pages_and_stock_filter() {
    let app = memory_router();
    let mut sold_out = kind_of_blue_input();
    sold_out.in_stock = false;

    for input in [time_out_input(), sold_out, time_out_input()] {
        let (status, _, _) = send(&app, Method::POST, "/albums", Some(input_json(&input))).await;
        assert_eq!(status, StatusCode::CREATED);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    settle().await;

    let (status, headers, page) = send(&app, Method::GET, "/albums?limit=2&offset=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[TOTAL_COUNT_HEADER], "3");
    assert_eq!(page.as_array().unwrap().len(), 2);

    let (_, _, stock) = send(&app, Method::GET, "/albums/stock", None).await;
    let stock = stock.as_array().unwrap();
    assert_eq!(stock.len(), 2);
    assert!(stock.iter().all(|a| a["in_stock"] == json!(true)));

    let (_, _, none) = send(&app, Method::GET, "/artists/Nobody/albums", None).await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_repeat_reads_are_served_from_cache() {
    let store = Arc::new(RecordingRepository::new());
    let app = router_with(store.clone(), Arc::new(InMemoryCacheBackend::new()));

    let (_, _, created) =
        send(&app, Method::POST, "/albums", Some(input_json(&time_out_input()))).await;
    settle().await;
    let uri = format!("/albums/{}", created["id"].as_str().unwrap());

    for _ in 0..3 {
        let (status, _, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        settle().await;
    }
    assert_eq!(store.get_by_id_calls(), 0);
}

#[tokio::test]
async fn test_cache_outage_is_invisible_to_clients() {
    let cache = Arc::new(FlakyCacheBackend::new());
    let app = router_with(Arc::new(InMemoryAlbumRepository::new()), cache.clone());
    cache.set_failing(true);

    let (status, _, created) =
        send(&app, Method::POST, "/albums", Some(input_json(&time_out_input()))).await;
    assert_eq!(status, StatusCode::CREATED);
    settle().await;

    let (status, _, fetched) = send(
        &app,
        Method::GET,
        &format!("/albums/{}", created["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

// ============================================================================
// HEALTH, METRICS, DOCS
// ============================================================================

#[tokio::test]
async fn test_health_reports_degraded_cache() {
    let cache = Arc::new(FlakyCacheBackend::new());
    let app = router_with(Arc::new(InMemoryAlbumRepository::new()), cache.clone());

    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["service"], "vintage-jazz-shop");

    cache.set_failing(true);
    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["details"]["cache"]["backend"], "flaky");

    let (status, _, body) = send(&app, Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_health_is_unavailable_without_database() {
    let db = DbClient::from_config(&DbConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        timeout: Duration::from_millis(200),
        ..DbConfig::default()
    })
    .unwrap();
    let health = HealthState::new("vintage-jazz-shop", "postgres").with_db(db);
    let service = AlbumService::new(Arc::new(InMemoryAlbumRepository::new()));
    let app = create_api_router(
        AppState::new(Arc::new(service), Arc::new(health)),
        &ApiConfig::default(),
    );

    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["details"]["database"]["error"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint_counts_requests() {
    let app = memory_router();
    send(&app, Method::GET, "/albums/stock", None).await;

    let (status, _, body) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("catalog_http_requests_total"));
}

#[cfg(feature = "openapi")]
#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = memory_router();
    let (status, _, body) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/albums"].is_object());
}
