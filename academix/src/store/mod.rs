//! Persistence seam. Services talk to `dyn Store`; the MongoDB backend is used
//! in production and the in-memory backend in tests and local runs.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::listing::{BlogFilter, Page, SortKey};
use crate::models::{Blog, Comment, LikeOutcome, LikeTarget, User};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Field changes applied to a blog by its author
#[derive(Debug, Clone, Default)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    async fn find_verified_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_verified_by_mis(&self, mis: &str) -> Result<Option<User>>;

    /// Users with the given ids, in no particular order
    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>>;

    /// Ids of users whose name contains `term`, ignoring case
    async fn find_user_ids_by_name(&self, term: &str) -> Result<Vec<String>>;

    /// User holding an unexpired reset token with this digest
    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>>;

    /// Drop the signup OTP of a pending user, if it is still `otp_hash`
    async fn clear_email_otp(&self, id: &str, otp_hash: &str, now: DateTime<Utc>) -> Result<()>;

    async fn set_reset_token(
        &self,
        id: &str,
        token_hash: &str,
        expires: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Drop the reset token, if it is still `token_hash`
    async fn clear_reset_token(&self, id: &str, token_hash: &str, now: DateTime<Utc>) -> Result<()>;

    /// Consume an unexpired reset token and store the new password hash in
    /// one update. `None` if the token is no longer valid.
    async fn complete_password_reset(
        &self,
        token_hash: &str,
        password_hash: &str,
        changed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    async fn set_profile_pic(
        &self,
        id: &str,
        profile_pic: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    /// Atomically mark a pending user verified if the OTP digest matches and
    /// has not expired. Returns the updated user, or `None` if nothing matched.
    /// Fails with `Unauthorized` if another verified account already holds
    /// the email or MIS.
    async fn verify_pending_user(
        &self,
        id: &str,
        otp_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    /// Delete pending users whose OTP expired before `now` or was never stored.
    /// Returns the number of deleted accounts.
    async fn purge_unverified(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn insert_blog(&self, blog: &Blog) -> Result<()>;

    async fn find_blog(&self, id: &str) -> Result<Option<Blog>>;

    /// Atomically increment `viewsCount` and return the updated blog
    async fn record_view(&self, id: &str) -> Result<Option<Blog>>;

    async fn list_blogs(&self, filter: &BlogFilter, sort: &[SortKey], page: Page) -> Result<Vec<Blog>>;

    async fn count_blogs(&self, filter: &BlogFilter) -> Result<u64>;

    async fn update_blog(&self, id: &str, patch: &BlogPatch, now: DateTime<Utc>) -> Result<Option<Blog>>;

    async fn delete_blog(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>>;

    async fn comments_for_blog(&self, blog_id: &str, sort: &[SortKey]) -> Result<Vec<Comment>>;

    async fn update_comment_content(
        &self,
        id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>>;

    /// Delete a single comment. Replies are left untouched.
    async fn delete_comment(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Toggle `user_id` in the document's like set and adjust `likesCount` in
    /// the same atomic update. `None` if the document does not exist.
    async fn toggle_like(&self, target: LikeTarget, id: &str, user_id: &str) -> Result<Option<LikeOutcome>>;
}

/// Everything the portal services need from persistence
pub trait Store: UserStore + BlogStore + CommentStore + LikeStore {}

impl<T> Store for T where T: UserStore + BlogStore + CommentStore + LikeStore {}
