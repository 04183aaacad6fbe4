use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BlogPatch, BlogStore, CommentStore, LikeStore, UserStore};
use crate::accounts::{DUPLICATE_EMAIL, DUPLICATE_MIS};
use crate::error::{PortalError, Result};
use crate::listing::{compare_by, contains_ignore_case, BlogFilter, Page, SortKey};
use crate::models::{AccountStatus, Blog, Comment, LikeOutcome, LikeTarget, Likeable, User};

pub type UserDatabase = Arc<RwLock<HashMap<String, User>>>;
pub type BlogDatabase = Arc<RwLock<HashMap<String, Blog>>>;
pub type CommentDatabase = Arc<RwLock<HashMap<String, Comment>>>;

/// In-process store. Every mutation happens under the collection's write
/// lock, so read-modify-write sequences are atomic per document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: UserDatabase,
    blogs: BlogDatabase,
    comments: CommentDatabase,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn toggle<T: Likeable>(document: &mut T, user_id: &str) -> LikeOutcome {
    let user_liked = document.toggle_like(user_id);
    LikeOutcome {
        likes_count: document.likes_count(),
        user_liked,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        self.users.write().await.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_verified_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.is_verified() && u.email == email)
            .cloned())
    }

    async fn find_verified_by_mis(&self, mis: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.is_verified() && u.mis == mis)
            .cloned())
    }

    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn find_user_ids_by_name(&self, term: &str) -> Result<Vec<String>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| contains_ignore_case(&u.name, term))
            .map(|u| u.id.clone())
            .collect())
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                u.password_reset_token.as_deref() == Some(token_hash)
                    && u.password_reset_expires.is_some_and(|expires| expires > now)
            })
            .cloned())
    }

    async fn clear_email_otp(&self, id: &str, otp_hash: &str, now: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(id) {
            if user.status == AccountStatus::Pending && user.email_otp.as_deref() == Some(otp_hash) {
                user.email_otp = None;
                user.email_otp_expires = None;
                user.updated_at = now;
            }
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: &str,
        token_hash: &str,
        expires: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(id) {
            user.password_reset_token = Some(token_hash.to_string());
            user.password_reset_expires = Some(expires);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn clear_reset_token(&self, id: &str, token_hash: &str, now: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(id) {
            if user.password_reset_token.as_deref() == Some(token_hash) {
                user.password_reset_token = None;
                user.password_reset_expires = None;
                user.updated_at = now;
            }
        }
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        token_hash: &str,
        password_hash: &str,
        changed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.values_mut().find(|u| {
            u.password_reset_token.as_deref() == Some(token_hash)
                && u.password_reset_expires.is_some_and(|expires| expires > now)
        }) else {
            return Ok(None);
        };

        user.password_hash = password_hash.to_string();
        user.password_reset_token = None;
        user.password_reset_expires = None;
        user.password_changed_at = Some(changed_at);
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn set_profile_pic(
        &self,
        id: &str,
        profile_pic: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(id).map(|user| {
            user.profile_pic = profile_pic.map(str::to_string);
            user.updated_at = now;
            user.clone()
        }))
    }

    async fn verify_pending_user(
        &self,
        id: &str,
        otp_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(candidate) = users.get(id) else {
            return Ok(None);
        };
        let (email, mis) = (candidate.email.clone(), candidate.mis.clone());
        for other in users.values().filter(|u| u.is_verified() && u.id != id) {
            if other.email == email {
                return Err(PortalError::unauthorized(DUPLICATE_EMAIL));
            }
            if other.mis == mis {
                return Err(PortalError::unauthorized(DUPLICATE_MIS));
            }
        }

        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };
        let matches = user.status == AccountStatus::Pending
            && user.email_otp.as_deref() == Some(otp_hash)
            && user.email_otp_expires.is_some_and(|expires| expires > now);
        if !matches {
            return Ok(None);
        }

        user.status = AccountStatus::Verified;
        user.email_otp = None;
        user.email_otp_expires = None;
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn purge_unverified(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|_, u| {
            u.status == AccountStatus::Verified
                || u.email_otp_expires.is_some_and(|expires| expires > now)
        });
        Ok((before - users.len()) as u64)
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn insert_blog(&self, blog: &Blog) -> Result<()> {
        self.blogs.write().await.insert(blog.id.clone(), blog.clone());
        Ok(())
    }

    async fn find_blog(&self, id: &str) -> Result<Option<Blog>> {
        Ok(self.blogs.read().await.get(id).cloned())
    }

    async fn record_view(&self, id: &str) -> Result<Option<Blog>> {
        let mut blogs = self.blogs.write().await;
        Ok(blogs.get_mut(id).map(|blog| {
            blog.views_count += 1;
            blog.clone()
        }))
    }

    async fn list_blogs(&self, filter: &BlogFilter, sort: &[SortKey], page: Page) -> Result<Vec<Blog>> {
        let blogs = self.blogs.read().await;
        let mut matching: Vec<&Blog> = blogs.values().filter(|b| filter.matches(b)).collect();
        matching.sort_by(|a, b| compare_by(*a, *b, sort));

        Ok(matching
            .into_iter()
            .skip(page.skip() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn count_blogs(&self, filter: &BlogFilter) -> Result<u64> {
        let blogs = self.blogs.read().await;
        Ok(blogs.values().filter(|b| filter.matches(b)).count() as u64)
    }

    async fn update_blog(&self, id: &str, patch: &BlogPatch, now: DateTime<Utc>) -> Result<Option<Blog>> {
        let mut blogs = self.blogs.write().await;
        Ok(blogs.get_mut(id).map(|blog| {
            if let Some(title) = &patch.title {
                blog.title = title.clone();
            }
            if let Some(content) = &patch.content {
                blog.content = content.clone();
            }
            if let Some(tags) = &patch.tags {
                blog.tags = tags.clone();
            }
            blog.updated_at = now;
            blog.clone()
        }))
    }

    async fn delete_blog(&self, id: &str) -> Result<bool> {
        Ok(self.blogs.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.comments
            .write()
            .await
            .insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.comments.read().await.get(id).cloned())
    }

    async fn comments_for_blog(&self, blog_id: &str, sort: &[SortKey]) -> Result<Vec<Comment>> {
        let comments = self.comments.read().await;
        let mut matching: Vec<Comment> = comments
            .values()
            .filter(|c| c.blog == blog_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_by(a, b, sort));
        Ok(matching)
    }

    async fn update_comment_content(
        &self,
        id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>> {
        let mut comments = self.comments.write().await;
        Ok(comments.get_mut(id).map(|comment| {
            comment.content = content.to_string();
            comment.updated_at = now;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: &str) -> Result<bool> {
        Ok(self.comments.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn toggle_like(&self, target: LikeTarget, id: &str, user_id: &str) -> Result<Option<LikeOutcome>> {
        let outcome = match target {
            LikeTarget::Blog => self
                .blogs
                .write()
                .await
                .get_mut(id)
                .map(|blog| toggle(blog, user_id)),
            LikeTarget::Comment => self
                .comments
                .write()
                .await
                .get_mut(id)
                .map(|comment| toggle(comment, user_id)),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{parse_sort, SortField};
    use chrono::Duration;

    fn blog(id: &str, title: &str, tags: &[&str]) -> Blog {
        let now = Utc::now();
        Blog {
            id: id.to_string(),
            title: title.to_string(),
            content: format!("<p>{title}</p>"),
            author: "author-1".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            likes: vec![],
            likes_count: 0,
            views_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn pending_user(id: &str, otp_expires: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            name: "Pending".to_string(),
            email: format!("{id}@example.com"),
            mis: "612303001".to_string(),
            password_hash: "hash".to_string(),
            profile_pic: None,
            status: AccountStatus::Pending,
            email_otp: Some("digest".to_string()),
            email_otp_expires: otp_expires,
            password_reset_token: None,
            password_reset_expires: None,
            password_changed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_concurrent_toggles_keep_counter_consistent() {
        let store = MemoryStore::new();
        store.insert_blog(&blog("b1", "Series", &[])).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .toggle_like(LikeTarget::Blog, "b1", &format!("user-{}", i % 5))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = store.find_blog("b1").await.unwrap().unwrap();
        // each of the 5 users toggled 4 times
        assert!(stored.likes.is_empty());
        assert_eq!(stored.likes_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_missing_document() {
        let store = MemoryStore::new();
        let outcome = store
            .toggle_like(LikeTarget::Comment, "nope", "u1")
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_list_sorts_and_paginates() {
        let store = MemoryStore::new();
        store.insert_blog(&blog("b1", "Calculus", &["math"])).await.unwrap();
        store.insert_blog(&blog("b2", "Algebra", &["math"])).await.unwrap();
        store.insert_blog(&blog("b3", "Optics", &["physics"])).await.unwrap();

        let sort = parse_sort(Some("title"), SortField::BLOG_FIELDS);
        let filter = BlogFilter {
            tags: vec!["math".to_string()],
            ..Default::default()
        };

        let first = store
            .list_blogs(&filter, &sort, Page { page: 1, limit: 1 })
            .await
            .unwrap();
        let second = store
            .list_blogs(&filter, &sort, Page { page: 2, limit: 1 })
            .await
            .unwrap();

        assert_eq!(first[0].title, "Algebra");
        assert_eq!(second[0].title, "Calculus");
        assert_eq!(store.count_blogs(&filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purge_only_removes_expired_pending_users() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store
            .insert_user(&pending_user("expired", Some(now - Duration::minutes(1))))
            .await
            .unwrap();
        store
            .insert_user(&pending_user("fresh", Some(now + Duration::minutes(5))))
            .await
            .unwrap();
        store.insert_user(&pending_user("no-otp", None)).await.unwrap();
        let mut verified = pending_user("verified", None);
        verified.status = AccountStatus::Verified;
        store.insert_user(&verified).await.unwrap();

        let removed = store.purge_unverified(now).await.unwrap();

        assert_eq!(removed, 2);
        assert!(store.find_user("expired").await.unwrap().is_none());
        assert!(store.find_user("no-otp").await.unwrap().is_none());
        assert!(store.find_user("fresh").await.unwrap().is_some());
        assert!(store.find_user("verified").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_verify_refuses_address_already_verified() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut winner = pending_user("winner", None);
        winner.email = "shared@example.com".to_string();
        winner.status = AccountStatus::Verified;
        store.insert_user(&winner).await.unwrap();

        let mut loser = pending_user("loser", Some(now + Duration::minutes(5)));
        loser.email = "shared@example.com".to_string();
        loser.mis = "612303002".to_string();
        store.insert_user(&loser).await.unwrap();

        let err = store
            .verify_pending_user("loser", "digest", now)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_EMAIL);
        let stored = store.find_user("loser").await.unwrap().unwrap();
        assert_eq!(stored.status, AccountStatus::Pending);
    }

    #[tokio::test]
    async fn test_password_reset_consumes_token_once() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut user = pending_user("u1", None);
        user.status = AccountStatus::Verified;
        store.insert_user(&user).await.unwrap();
        store
            .set_reset_token("u1", "reset-digest", now + Duration::minutes(10), now)
            .await
            .unwrap();

        let changed = store
            .complete_password_reset("reset-digest", "new-hash", now, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(changed.password_hash, "new-hash");
        assert!(changed.password_reset_token.is_none());

        let again = store
            .complete_password_reset("reset-digest", "other-hash", now, now)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_profile_pic_update_leaves_password_alone() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert_user(&pending_user("u1", None)).await.unwrap();
        store
            .set_reset_token("u1", "reset-digest", now + Duration::minutes(10), now)
            .await
            .unwrap();
        store
            .complete_password_reset("reset-digest", "new-hash", now, now)
            .await
            .unwrap();

        let updated = store
            .set_profile_pic("u1", Some("avatar.png"), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.profile_pic.as_deref(), Some("avatar.png"));
        assert_eq!(updated.password_hash, "new-hash");
        assert!(updated.password_changed_at.is_some());
    }
}
