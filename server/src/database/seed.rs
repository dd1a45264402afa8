use std::path::Path;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use shared::types::blog::SeedPost;

use crate::database::blog::{count_posts, create_post};
use crate::database::utils::today_string;

/// Import posts from a JSON array. Does nothing unless the blog is empty.
/// Returns how many posts were written. All posts land or none do, so a
/// failed import can be retried.
pub async fn seed_posts(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let existing = count_posts(pool).await.context("Failed to count posts")?;
    if existing > 0 {
        info!("Blog already has {} posts, skipping seed", existing);
        return Ok(0);
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let posts: Vec<SeedPost> = serde_json::from_str(&raw)
        .with_context(|| format!("Seed file {} is not a JSON array of posts", path.display()))?;

    let today = today_string();
    let total = posts.len();

    let mut tx = pool.begin().await.context("Failed to start seed transaction")?;
    for post in posts {
        create_post(&mut *tx, post.into_new_post(&today))
            .await
            .context("Failed to insert seed post")?;
    }
    tx.commit().await.context("Failed to commit seed posts")?;

    info!("Seeded {} blog posts from {}", total, path.display());
    Ok(total)
}
