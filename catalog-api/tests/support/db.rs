use catalog_api::db::{DbClient, DbConfig};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS albums (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    artist      TEXT NOT NULL,
    price       NUMERIC(10, 2) NOT NULL,
    year        INTEGER NOT NULL,
    genre       TEXT,
    condition   TEXT,
    in_stock    BOOLEAN NOT NULL DEFAULT TRUE,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
)";

/// Client for the database named by `CATALOG_DB_*`, with the albums table
/// in place.
pub async fn test_db_client() -> DbClient {
    let config = DbConfig::from_env();
    let db = DbClient::from_config(&config).expect("Failed to create database client");
    let conn = db.pool().get().await.expect("Failed to reach test database");
    conn.batch_execute(CREATE_TABLE)
        .await
        .expect("Failed to create albums table");
    db
}

/// An artist name no other test run will use.
pub fn unique_artist(label: &str) -> String {
    format!("{} {}", label, catalog_core::new_album_id())
}
