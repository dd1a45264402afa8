use serde::{Deserialize, Serialize};

/// Number of characters of content kept in an auto-generated preview.
pub const PREVIEW_CHARS: usize = 100;

/// A persisted blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub image: String,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
}

/// Body of `POST /api/blog` and `PUT /api/blog/:id`.
///
/// Every field is optional on the wire; creation requires `title` and
/// `content`, updates fall back to stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogPostInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
}

/// Fully-resolved values for a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    pub preview: String,
    pub image: String,
    pub date: String,
}

/// Seed file entry (`--seed-posts`).
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// First [`PREVIEW_CHARS`] characters of `content` followed by `...`.
pub fn derive_preview(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl BlogPostInput {
    /// Resolve a creation request. Returns `None` when title or content is
    /// missing or empty.
    pub fn into_new_post(self, today: &str) -> Option<NewBlogPost> {
        let title = non_empty(&self.title)?.to_string();
        let content = non_empty(&self.content)?.to_string();
        let preview = non_empty(&self.preview)
            .map(str::to_string)
            .unwrap_or_else(|| derive_preview(&content));

        Some(NewBlogPost {
            title,
            content,
            preview,
            image: self.image.unwrap_or_default(),
            date: today.to_string(),
        })
    }

    /// Merge an update into an existing post.
    ///
    /// Empty strings count as absent for title, content and preview. The
    /// image is replaced whenever the field is present, so `""` clears it.
    pub fn apply_to(self, existing: &BlogPost, today: &str) -> NewBlogPost {
        let content = non_empty(&self.content).map(str::to_string);
        let preview = match (non_empty(&self.preview), &content) {
            (Some(p), _) => p.to_string(),
            (None, Some(c)) => derive_preview(c),
            (None, None) => existing.preview.clone(),
        };

        NewBlogPost {
            title: non_empty(&self.title)
                .map(str::to_string)
                .unwrap_or_else(|| existing.title.clone()),
            content: content.unwrap_or_else(|| existing.content.clone()),
            preview,
            image: self.image.unwrap_or_else(|| existing.image.clone()),
            date: today.to_string(),
        }
    }
}

impl SeedPost {
    pub fn into_new_post(self, today: &str) -> NewBlogPost {
        let preview = self
            .preview
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| derive_preview(&self.content));
        NewBlogPost {
            title: self.title,
            content: self.content,
            preview,
            image: self.image.unwrap_or_default(),
            date: self.date.unwrap_or_else(|| today.to_string()),
        }
    }
}
