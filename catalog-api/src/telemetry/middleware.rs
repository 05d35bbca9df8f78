//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in an `http_request` span, records Prometheus
//! metrics and logs completion.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info_span, Instrument};

use super::metrics::METRICS;

// UUID pattern: 8-4-4-4-12 hex chars
static UUID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .ok()
});

// Numeric ID pattern
static ID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\d+(/|$)").ok());

// Free-text artist segment
static ARTIST_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^/artists/[^/]+/albums$").ok());

/// Normalize a path for metric labels and span fields.
///
/// Ids and artist names become placeholders to keep label cardinality flat.
pub(crate) fn normalize_path(path: &str) -> String {
    if let Some(artist) = ARTIST_PATTERN.as_ref() {
        if artist.is_match(path) {
            return "/artists/{artist}/albums".to_string();
        }
    }

    let mut result = path.to_string();
    if let Some(uuid) = UUID_PATTERN.as_ref() {
        result = uuid.replace_all(&result, "{id}").into_owned();
    }
    if let Some(id) = ID_PATTERN.as_ref() {
        result = id.replace_all(&result, "/{id}$1").into_owned();
    }
    result
}

/// Observability middleware for Axum.
///
/// This middleware wraps every request with:
/// 1. A tracing span
/// 2. Prometheus metrics recording
/// 3. A completion log line
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/albums/0192f0c1-7d2a-7c3e-9a4b-1f2e3d4c5b6a";
        assert_eq!(normalize_path(path), "/albums/{id}");
    }

    #[test]
    fn test_normalize_path_numeric_id() {
        assert_eq!(normalize_path("/albums/12345"), "/albums/{id}");
    }

    #[test]
    fn test_normalize_path_artist() {
        assert_eq!(
            normalize_path("/artists/Dave%20Brubeck/albums"),
            "/artists/{artist}/albums"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/albums/stock"), "/albums/stock");
        assert_eq!(normalize_path("/health/live"), "/health/live");
    }
}
