use sqlx::{FromRow, SqlitePool};

use shared::types::client::{Client, ClientFields};

#[derive(Debug, FromRow)]
struct ClientRow {
    id: i64,
    name: String,
    logo: String,
    website: Option<String>,
    sort_order: i64,
    active: bool,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            logo: row.logo,
            website: row.website,
            order: row.sort_order,
            active: row.active,
        }
    }
}

/// Clients in display order. Inactive clients are included only when
/// `include_inactive` is set.
pub async fn list_clients(
    pool: &SqlitePool,
    include_inactive: bool,
) -> Result<Vec<Client>, sqlx::Error> {
    let sql = if include_inactive {
        "SELECT id, name, logo, website, sort_order, active
         FROM clients
         ORDER BY sort_order ASC, id ASC"
    } else {
        "SELECT id, name, logo, website, sort_order, active
         FROM clients
         WHERE active = 1
         ORDER BY sort_order ASC, id ASC"
    };

    let rows: Vec<ClientRow> = sqlx::query_as(sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(Client::from).collect())
}

pub async fn get_client(pool: &SqlitePool, id: i64) -> Result<Option<Client>, sqlx::Error> {
    let row: Option<ClientRow> = sqlx::query_as(
        "SELECT id, name, logo, website, sort_order, active
         FROM clients
         WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Client::from))
}

pub async fn create_client(pool: &SqlitePool, fields: ClientFields) -> Result<Client, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO clients (name, logo, website, sort_order, active)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&fields.name)
    .bind(&fields.logo)
    .bind(&fields.website)
    .bind(fields.order)
    .bind(fields.active)
    .execute(pool)
    .await?;

    Ok(Client {
        id: result.last_insert_rowid(),
        name: fields.name,
        logo: fields.logo,
        website: fields.website,
        order: fields.order,
        active: fields.active,
    })
}

/// Overwrite client `id`. `None` when no such client.
pub async fn update_client(
    pool: &SqlitePool,
    id: i64,
    fields: ClientFields,
) -> Result<Option<Client>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE clients
         SET name = ?1, logo = ?2, website = ?3, sort_order = ?4, active = ?5
         WHERE id = ?6",
    )
    .bind(&fields.name)
    .bind(&fields.logo)
    .bind(&fields.website)
    .bind(fields.order)
    .bind(fields.active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    Ok(Some(Client {
        id,
        name: fields.name,
        logo: fields.logo,
        website: fields.website,
        order: fields.order,
        active: fields.active,
    }))
}

/// Delete client `id`, returning the removed record so its logo can be
/// cleaned up.
pub async fn delete_client(pool: &SqlitePool, id: i64) -> Result<Option<Client>, sqlx::Error> {
    let Some(existing) = get_client(pool, id).await? else {
        return Ok(None);
    };

    let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok((result.rows_affected() > 0).then_some(existing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::test_pool;

    fn fields(name: &str, order: i64, active: bool) -> ClientFields {
        ClientFields {
            name: name.to_string(),
            logo: format!("/api/uploads/{}.png", name),
            website: None,
            order,
            active,
        }
    }

    #[tokio::test]
    async fn list_orders_and_filters_inactive() {
        let pool = test_pool().await;
        create_client(&pool, fields("b", 2, true)).await.unwrap();
        create_client(&pool, fields("a", 1, true)).await.unwrap();
        create_client(&pool, fields("hidden", 0, false)).await.unwrap();

        let active: Vec<String> = list_clients(&pool, false)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(active, vec!["a", "b"]);

        let all = list_clients(&pool, true).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "hidden");
        assert!(!all[0].active);
    }

    #[tokio::test]
    async fn update_then_delete_returns_record() {
        let pool = test_pool().await;
        let c = create_client(&pool, fields("acme", 0, true)).await.unwrap();

        let mut changed = fields("acme", 5, false);
        changed.website = Some("https://acme.test".into());
        let updated = update_client(&pool, c.id, changed).await.unwrap().unwrap();
        assert_eq!(updated.order, 5);
        assert_eq!(updated.website.as_deref(), Some("https://acme.test"));
        assert!(update_client(&pool, 999, fields("x", 0, true)).await.unwrap().is_none());

        let removed = delete_client(&pool, c.id).await.unwrap().unwrap();
        assert_eq!(removed.logo, "/api/uploads/acme.png");
        assert!(delete_client(&pool, c.id).await.unwrap().is_none());
    }
}
