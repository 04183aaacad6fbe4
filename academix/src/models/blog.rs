use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{timestamp, AuthorSummary, Likeable};

/// Internal Blog document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub title: String,
    /// Rich text (HTML) body
    pub content: String,
    /// Author user id
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub views_count: u64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn to_view(&self, author: AuthorSummary) -> BlogView {
        BlogView {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            author,
            tags: self.tags.clone(),
            likes: self.likes.clone(),
            likes_count: self.likes_count,
            views_count: self.views_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Likeable for Blog {
    fn likes(&self) -> &[String] {
        &self.likes
    }

    fn likes_mut(&mut self) -> &mut Vec<String> {
        &mut self.likes
    }

    fn likes_count(&self) -> u64 {
        self.likes_count
    }

    fn set_likes_count(&mut self, count: u64) {
        self.likes_count = count;
    }
}

/// Blog as returned by the API, with the author populated
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    pub tags: Vec<String>,
    pub likes: Vec<String>,
    pub likes_count: u64,
    pub views_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalize user-supplied tags: trimmed, lowercase, no blanks or duplicates
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
