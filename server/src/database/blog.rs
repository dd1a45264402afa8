use sqlx::{FromRow, SqliteExecutor, SqlitePool};

use shared::types::blog::{BlogPost, NewBlogPost};

#[derive(Debug, FromRow)]
struct BlogPostRow {
    id: i64,
    title: String,
    content: String,
    preview: String,
    image: String,
    date: String,
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        BlogPost {
            id: row.id,
            title: row.title,
            content: row.content,
            preview: row.preview,
            image: row.image,
            date: row.date,
        }
    }
}

/// All posts, newest first.
pub async fn list_posts(pool: &SqlitePool) -> Result<Vec<BlogPost>, sqlx::Error> {
    let rows: Vec<BlogPostRow> = sqlx::query_as(
        "SELECT id, title, content, preview, image, date
         FROM blog_posts
         ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(BlogPost::from).collect())
}

pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<BlogPost>, sqlx::Error> {
    let row: Option<BlogPostRow> = sqlx::query_as(
        "SELECT id, title, content, preview, image, date
         FROM blog_posts
         WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(BlogPost::from))
}

/// Insert a post and return it with its new id. Takes a pool or an open
/// transaction.
pub async fn create_post<'e, E>(executor: E, post: NewBlogPost) -> Result<BlogPost, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO blog_posts (title, content, preview, image, date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.preview)
    .bind(&post.image)
    .bind(&post.date)
    .execute(executor)
    .await?;

    Ok(BlogPost {
        id: result.last_insert_rowid(),
        title: post.title,
        content: post.content,
        preview: post.preview,
        image: post.image,
        date: post.date,
    })
}

/// Overwrite every field of post `id`. `None` when no such post.
pub async fn update_post(
    pool: &SqlitePool,
    id: i64,
    post: NewBlogPost,
) -> Result<Option<BlogPost>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE blog_posts
         SET title = ?1, content = ?2, preview = ?3, image = ?4, date = ?5
         WHERE id = ?6",
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.preview)
    .bind(&post.image)
    .bind(&post.date)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    Ok(Some(BlogPost {
        id,
        title: post.title,
        content: post.content,
        preview: post.preview,
        image: post.image,
        date: post.date,
    }))
}

/// Returns whether a row was removed.
pub async fn delete_post(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_posts(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts")
        .fetch_one(pool)
        .await
}
