use std::str::FromStr;

use shared::types::server_config::DatabaseConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration step in `create_tables`.
const SCHEMA_VERSION: i64 = 1;

/// Open the pool described by `cfg`, creating the database file if needed.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is never recycled.
pub async fn connect(cfg: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&cfg.url)?.create_if_missing(true);

    let pool = if cfg.url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(cfg.max_connections.max(1))
    };

    pool.connect_with(options).await
}

/// Initialize the database schema.
///
/// Uses `PRAGMA user_version` as the schema counter; every statement is
/// idempotent so running this against an existing database is safe.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let current: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    // Blog posts: `date` is the last-modified day as YYYY-MM-DD.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS blog_posts (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            title   TEXT    NOT NULL,
            content TEXT    NOT NULL,
            preview TEXT    NOT NULL,
            image   TEXT    NOT NULL DEFAULT '',
            date    TEXT    NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Clients shown on the home page, ordered by `sort_order`.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS clients (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            name       TEXT    NOT NULL,
            logo       TEXT    NOT NULL,
            website    TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            active     INTEGER NOT NULL DEFAULT 1
        )",
    )
    .execute(pool)
    .await?;

    // Editable page copy, one JSON document per key.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS site_content (
            key        TEXT    PRIMARY KEY,
            data       TEXT    NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_clients_active_order ON clients(active, sort_order)")
        .execute(pool)
        .await?;

    if current < SCHEMA_VERSION {
        info!(
            "Database schema at version {}; now at version {}",
            current, SCHEMA_VERSION
        );
        let pragma = format!("PRAGMA user_version = {}", SCHEMA_VERSION);
        sqlx::query(&pragma).execute(pool).await?;
    }

    Ok(())
}

/// In-memory database with the schema applied, for tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let cfg = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = connect(&cfg).await.unwrap();
    create_tables(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_tables_is_idempotent_and_sets_version() {
        let pool = test_pool().await;
        create_tables(&pool).await.unwrap();

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["blog_posts", "clients", "site_content"]);
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.db");
        let cfg = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 2,
        };
        let pool = connect(&cfg).await.unwrap();
        create_tables(&pool).await.unwrap();
        assert!(path.exists());
    }
}
