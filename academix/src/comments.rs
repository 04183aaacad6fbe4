use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::accounts::Session;
use crate::authors::AuthorDirectory;
use crate::error::{PortalError, Result};
use crate::listing::{non_blank, parse_sort, SortField, SortKey};
use crate::models::{
    AuthorSummary, Comment, CommentView, CreateCommentRequest, LikeTarget, UpdateCommentRequest,
};
use crate::store::Store;
use crate::thread::{CommentThread, NestedThread, MAX_REPLY_DEPTH};

const FORBIDDEN: &str = "You do not have permission to perform this action";
const EMPTY_COMMENT: &str = "Comment cannot be empty";

/// Comments of one blog, flat and threaded
#[derive(Debug, Clone, Serialize)]
pub struct CommentListing {
    pub comments: Vec<CommentView>,
    pub thread: NestedThread,
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Comment on a blog, or reply to a comment of the same blog
    pub async fn create(
        &self,
        session: &Session,
        blog_id: &str,
        request: CreateCommentRequest,
    ) -> Result<CommentView> {
        self.store
            .find_blog(blog_id)
            .await?
            .ok_or_else(|| PortalError::not_found(LikeTarget::Blog.not_found_message()))?;

        let content = non_blank(Some(request.content.as_str()))
            .ok_or_else(|| PortalError::bad_request(EMPTY_COMMENT))?;

        let parent_comment = match non_blank(request.parent_comment.as_deref()) {
            Some(parent_id) => {
                let parent = self
                    .store
                    .find_comment(&parent_id)
                    .await?
                    .ok_or_else(|| PortalError::not_found(LikeTarget::Comment.not_found_message()))?;
                if parent.blog != blog_id {
                    return Err(PortalError::bad_request(
                        "The parent comment belongs to a different blog",
                    ));
                }
                if self.reply_depth(&parent).await? > MAX_REPLY_DEPTH {
                    return Err(PortalError::bad_request(format!(
                        "Replies cannot be nested more than {MAX_REPLY_DEPTH} levels deep"
                    )));
                }
                Some(parent_id)
            }
            None => None,
        };

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            content,
            author: session.user_id().to_string(),
            blog: blog_id.to_string(),
            parent_comment,
            likes: Vec::new(),
            likes_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_comment(&comment).await?;

        info!("💬 Comment {} on blog {} by {}", comment.id, blog_id, comment.author);
        Ok(comment.to_view(AuthorSummary::from_user(&session.user, true)))
    }

    /// All comments of a blog in `sort` order (default newest first), with
    /// the materialized thread. Replies follow the same order.
    pub async fn list(&self, blog_id: &str, sort: Option<&str>) -> Result<CommentListing> {
        self.store
            .find_blog(blog_id)
            .await?
            .ok_or_else(|| PortalError::not_found(LikeTarget::Blog.not_found_message()))?;

        let sort: Vec<SortKey> = parse_sort(sort, SortField::COMMENT_FIELDS);
        let comments = self.store.comments_for_blog(blog_id, &sort).await?;

        let authors =
            AuthorDirectory::load(self.store.as_ref(), comments.iter().map(|c| c.author.as_str()), true)
                .await?;
        let comments: Vec<CommentView> = comments
            .iter()
            .map(|c| c.to_view(authors.get(&c.author)))
            .collect();

        let thread = CommentThread::build(comments.clone());
        debug!(
            "Blog {} has {} comments ({} top-level, {} orphaned)",
            blog_id,
            thread.comment_count(),
            thread.roots().count(),
            thread.orphans().count()
        );
        Ok(CommentListing {
            comments,
            thread: thread.nested(),
        })
    }

    pub async fn update(
        &self,
        session: &Session,
        blog_id: &str,
        comment_id: &str,
        request: UpdateCommentRequest,
    ) -> Result<CommentView> {
        let existing = self.owned_comment(session, blog_id, comment_id).await?;

        // an absent content keeps the current text
        let content = match request.content {
            Some(raw) => non_blank(Some(raw.as_str())).ok_or_else(|| PortalError::bad_request(EMPTY_COMMENT))?,
            None => existing.content,
        };

        let comment = self
            .store
            .update_comment_content(comment_id, &content, Utc::now())
            .await?
            .ok_or_else(|| PortalError::not_found(LikeTarget::Comment.not_found_message()))?;
        Ok(comment.to_view(AuthorSummary::from_user(&session.user, true)))
    }

    /// Delete one comment. Its replies are kept and surface as orphans.
    pub async fn delete(&self, session: &Session, blog_id: &str, comment_id: &str) -> Result<()> {
        self.owned_comment(session, blog_id, comment_id).await?;
        if !self.store.delete_comment(comment_id).await? {
            return Err(PortalError::not_found(LikeTarget::Comment.not_found_message()));
        }
        info!("🗑️ Comment {} deleted by {}", comment_id, session.user_id());
        Ok(())
    }

    /// Level a reply to `parent` would sit at, counting stored ancestors.
    /// Stops counting once past the cap; a deleted ancestor ends the chain.
    async fn reply_depth(&self, parent: &Comment) -> Result<usize> {
        let mut depth = 1;
        let mut cursor = parent.parent_comment.clone();
        while let Some(id) = cursor {
            if depth > MAX_REPLY_DEPTH {
                break;
            }
            match self.store.find_comment(&id).await? {
                Some(ancestor) => {
                    depth += 1;
                    cursor = ancestor.parent_comment;
                }
                None => break,
            }
        }
        Ok(depth)
    }

    async fn owned_comment(&self, session: &Session, blog_id: &str, comment_id: &str) -> Result<Comment> {
        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .filter(|c| c.blog == blog_id)
            .ok_or_else(|| PortalError::not_found(LikeTarget::Comment.not_found_message()))?;
        if !session.is_author_of(&comment.author) {
            return Err(PortalError::forbidden(FORBIDDEN));
        }
        Ok(comment)
    }
}
