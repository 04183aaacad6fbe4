use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::accounts::Session;
use crate::authors::AuthorDirectory;
use crate::error::{PortalError, Result};
use crate::listing::{non_blank, BlogFilter, BlogListQuery, BlogSearchQuery, Page, SortKey};
use crate::models::{
    normalize_tags, AuthorSummary, Blog, BlogView, CreateBlogRequest, LikeTarget, UpdateBlogRequest,
};
use crate::store::{BlogPatch, Store};

const FORBIDDEN: &str = "You do not have permission to perform this action";

/// One page of blogs plus the number of blogs matching the filter
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPage {
    pub total_count: u64,
    pub blogs: Vec<BlogView>,
}

#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn Store>,
}

impl BlogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, session: &Session, request: CreateBlogRequest) -> Result<BlogView> {
        let title = non_blank(Some(request.title.as_str()))
            .ok_or_else(|| PortalError::bad_request("A blog must have a title"))?;
        let content = non_blank(Some(request.content.as_str()))
            .ok_or_else(|| PortalError::bad_request("A blog must have content"))?;

        let now = Utc::now();
        let blog = Blog {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            author: session.user_id().to_string(),
            tags: normalize_tags(&request.tags),
            likes: Vec::new(),
            likes_count: 0,
            views_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_blog(&blog).await?;

        info!("📝 Blog {} created by {}", blog.id, blog.author);
        Ok(blog.to_view(AuthorSummary::from_user(&session.user, false)))
    }

    pub async fn list(&self, query: &BlogListQuery) -> Result<BlogPage> {
        self.page(&query.filter, &query.sort, query.page).await
    }

    /// Search by title and/or author. With neither term every blog matches.
    pub async fn search(&self, query: &BlogSearchQuery) -> Result<BlogPage> {
        let authors = match &query.author {
            Some(term) => {
                let mut ids = self.store.find_user_ids_by_name(term).await?;
                if let Some(user) = self.store.find_user(term).await? {
                    if !ids.contains(&user.id) {
                        ids.push(user.id);
                    }
                }
                Some(ids)
            }
            None => None,
        };

        let filter = BlogFilter {
            title: query.title.clone(),
            authors,
            ..Default::default()
        };
        self.page(&filter, &query.sort, query.page).await
    }

    /// Fetch a blog, counting the read as a view
    pub async fn get(&self, id: &str) -> Result<BlogView> {
        let blog = self
            .store
            .record_view(id)
            .await?
            .ok_or_else(|| PortalError::not_found(LikeTarget::Blog.not_found_message()))?;

        let authors = AuthorDirectory::load(self.store.as_ref(), [blog.author.as_str()], true).await?;
        Ok(blog.to_view(authors.get(&blog.author)))
    }

    pub async fn update(&self, session: &Session, id: &str, request: UpdateBlogRequest) -> Result<BlogView> {
        self.owned_blog(session, id).await?;

        let patch = BlogPatch {
            title: required_if_present(request.title, "A blog must have a title")?,
            content: required_if_present(request.content, "A blog must have content")?,
            tags: request.tags.map(normalize_tags),
        };
        let blog = self
            .store
            .update_blog(id, &patch, Utc::now())
            .await?
            .ok_or_else(|| PortalError::not_found(LikeTarget::Blog.not_found_message()))?;

        debug!("Blog {} updated", blog.id);
        Ok(blog.to_view(AuthorSummary::from_user(&session.user, false)))
    }

    /// Delete a blog. Its comments stay in the comment collection.
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        self.owned_blog(session, id).await?;
        if !self.store.delete_blog(id).await? {
            return Err(PortalError::not_found(LikeTarget::Blog.not_found_message()));
        }
        info!("🗑️ Blog {} deleted by {}", id, session.user_id());
        Ok(())
    }

    async fn owned_blog(&self, session: &Session, id: &str) -> Result<Blog> {
        let blog = self
            .store
            .find_blog(id)
            .await?
            .ok_or_else(|| PortalError::not_found(LikeTarget::Blog.not_found_message()))?;
        if !session.is_author_of(&blog.author) {
            return Err(PortalError::forbidden(FORBIDDEN));
        }
        Ok(blog)
    }

    async fn page(&self, filter: &BlogFilter, sort: &[SortKey], page: Page) -> Result<BlogPage> {
        let blogs = self.store.list_blogs(filter, sort, page).await?;
        let total_count = self.store.count_blogs(filter).await?;

        let authors =
            AuthorDirectory::load(self.store.as_ref(), blogs.iter().map(|b| b.author.as_str()), false)
                .await?;
        Ok(BlogPage {
            total_count,
            blogs: blogs
                .iter()
                .map(|blog| blog.to_view(authors.get(&blog.author)))
                .collect(),
        })
    }
}

fn required_if_present(value: Option<String>, message: &str) -> Result<Option<String>> {
    match value {
        Some(raw) => non_blank(Some(raw.as_str()))
            .map(Some)
            .ok_or_else(|| PortalError::bad_request(message)),
        None => Ok(None),
    }
}
