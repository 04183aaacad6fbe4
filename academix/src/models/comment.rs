use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{timestamp, AuthorSummary, Likeable};

/// Internal Comment document. Replies point at their parent through
/// `parent_comment`; nothing points the other way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    /// Author user id
    pub author: String,
    /// Blog id
    pub blog: String,
    #[serde(default)]
    pub parent_comment: Option<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn to_view(&self, author: AuthorSummary) -> CommentView {
        CommentView {
            id: self.id.clone(),
            content: self.content.clone(),
            author,
            blog: self.blog.clone(),
            parent_comment: self.parent_comment.clone(),
            likes: self.likes.clone(),
            likes_count: self.likes_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Likeable for Comment {
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

/// Comment as returned by the API, with the author populated
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub author: AuthorSummary,
    pub blog: String,
    pub parent_comment: Option<String>,
    pub likes: Vec<String>,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
