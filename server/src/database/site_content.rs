use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::utils::get_timestamp;

/// Stored JSON document for `key`, if any. A row that no longer parses as
/// JSON is reported as absent.
pub async fn get_content(pool: &SqlitePool, key: &str) -> Result<Option<Value>, sqlx::Error> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM site_content WHERE key = ?1")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(data.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Stored site content for {} is not valid JSON: {}", key, e);
            None
        }
    }))
}

/// Insert or replace the document for `key`.
pub async fn put_content(pool: &SqlitePool, key: &str, value: &Value) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO site_content (key, data, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value.to_string())
    .bind(get_timestamp())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::test_pool;
    use serde_json::json;

    #[tokio::test]
    async fn put_then_get_replaces() {
        let pool = test_pool().await;
        assert!(get_content(&pool, "home").await.unwrap().is_none());

        put_content(&pool, "home", &json!({"a": 1})).await.unwrap();
        put_content(&pool, "home", &json!({"a": 2})).await.unwrap();
        assert_eq!(get_content(&pool, "home").await.unwrap(), Some(json!({"a": 2})));
    }

    #[tokio::test]
    async fn corrupt_row_reads_as_absent() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO site_content (key, data, updated_at) VALUES ('home', '{not json', 0)")
            .execute(&pool)
            .await
            .unwrap();
        assert!(get_content(&pool, "home").await.unwrap().is_none());
    }
}
