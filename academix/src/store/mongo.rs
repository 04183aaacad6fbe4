use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Cursor, Database, IndexModel};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{BlogPatch, BlogStore, CommentStore, LikeStore, UserStore};
use crate::accounts::{DUPLICATE_EMAIL, DUPLICATE_MIS};
use crate::error::{PortalError, Result};
use crate::listing::{BlogFilter, Page, SortKey};
use crate::models::timestamp;
use crate::models::{Blog, Comment, LikeOutcome, LikeTarget, Likeable, User};

const USERS: &str = "users";
const BLOGS: &str = "blogs";
const COMMENTS: &str = "comments";

const VERIFIED_EMAIL_INDEX: &str = "verified_email_unique";
const VERIFIED_MIS_INDEX: &str = "verified_mis_unique";
const DUPLICATE_KEY: i32 = 11000;

/// A toggle only loops when another request flips the same like between
/// our two conditional updates.
const MAX_TOGGLE_ATTEMPTS: usize = 5;

/// MongoDB-backed store; one collection per document type, linked by `id`
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    pub fn blogs(&self) -> Collection<Blog> {
        self.db.collection(BLOGS)
    }

    pub fn comments(&self) -> Collection<Comment> {
        self.db.collection(COMMENTS)
    }

    /// Create the indexes the queries rely on
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_id = || {
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };

        // at most one verified account per email and per MIS; pending
        // signups for the same address may coexist
        let unique_verified = |field: &str, name: &str| {
            let mut keys = Document::new();
            keys.insert(field, 1);
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(true)
                        .partial_filter_expression(doc! { "status": "verified" })
                        .build(),
                )
                .build()
        };

        self.users().create_index(unique_id()).await?;
        self.users()
            .create_index(unique_verified("email", VERIFIED_EMAIL_INDEX))
            .await?;
        self.users()
            .create_index(unique_verified("mis", VERIFIED_MIS_INDEX))
            .await?;

        self.blogs().create_index(unique_id()).await?;
        self.blogs()
            .create_index(IndexModel::builder().keys(doc! { "tags": 1 }).build())
            .await?;

        self.comments().create_index(unique_id()).await?;
        self.comments()
            .create_index(IndexModel::builder().keys(doc! { "blog": 1 }).build())
            .await?;

        info!("MongoDB indexes ensured");
        Ok(())
    }
}

async fn collect<T: DeserializeOwned + Send + Sync>(mut cursor: Cursor<T>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    while cursor.advance().await? {
        items.push(cursor.deserialize_current()?);
    }
    Ok(items)
}

/// Server message of a duplicate-key failure, if that is what `err` is
fn duplicate_key_message(err: &mongodb::error::Error) -> Option<&str> {
    match err.kind.as_ref() {
        ErrorKind::Command(e) if e.code == DUPLICATE_KEY => Some(e.message.as_str()),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY => {
            Some(e.message.as_str())
        }
        _ => None,
    }
}

/// Translate a duplicate-key message from the verified-account indexes
fn duplicate_account(message: &str) -> PortalError {
    if message.contains(VERIFIED_MIS_INDEX) {
        PortalError::unauthorized(DUPLICATE_MIS)
    } else {
        PortalError::unauthorized(DUPLICATE_EMAIL)
    }
}

fn case_insensitive(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}

fn blog_filter_document(filter: &BlogFilter) -> Document {
    let mut clauses: Vec<Document> = Vec::new();

    if !filter.tags.is_empty() {
        clauses.push(doc! { "tags": { "$in": filter.tags.clone() } });
    }
    if let Some(term) = &filter.search {
        clauses.push(doc! {
            "$or": [
                { "title": case_insensitive(term) },
                { "content": case_insensitive(term) },
            ]
        });
    }
    if let Some(term) = &filter.title {
        clauses.push(doc! { "title": case_insensitive(term) });
    }
    if let Some(authors) = &filter.authors {
        clauses.push(doc! { "author": { "$in": authors.clone() } });
    }

    if clauses.is_empty() {
        Document::new()
    } else {
        doc! { "$and": clauses }
    }
}

fn sort_document(keys: &[SortKey]) -> Document {
    let mut sort = Document::new();
    for key in keys {
        sort.insert(key.field.document_key(), if key.descending { -1 } else { 1 });
    }
    sort.insert("id", 1);
    sort
}

/// Toggle a like using two membership-conditioned updates. Each update
/// changes the like set and the counter together, so `likesCount` can never
/// drift from the set size.
async fn toggle_in<T>(collection: &Collection<T>, id: &str, user_id: &str) -> Result<Option<LikeOutcome>>
where
    T: Likeable + DeserializeOwned + Send + Sync,
{
    for attempt in 1..=MAX_TOGGLE_ATTEMPTS {
        let liked = collection
            .find_one_and_update(
                doc! { "id": id, "likes": { "$ne": user_id } },
                doc! { "$push": { "likes": user_id }, "$inc": { "likesCount": 1_i64 } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        if let Some(document) = liked {
            return Ok(Some(LikeOutcome {
                likes_count: document.likes_count(),
                user_liked: true,
            }));
        }

        let unliked = collection
            .find_one_and_update(
                doc! { "id": id, "likes": user_id },
                doc! { "$pull": { "likes": user_id }, "$inc": { "likesCount": -1_i64 } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        if let Some(document) = unliked {
            return Ok(Some(LikeOutcome {
                likes_count: document.likes_count(),
                user_liked: false,
            }));
        }

        if collection.count_documents(doc! { "id": id }).await? == 0 {
            return Ok(None);
        }
        debug!("Like on {} changed concurrently (attempt {})", id, attempt);
    }

    Err(PortalError::internal_error(format!(
        "like toggle on {id} did not settle after {MAX_TOGGLE_ATTEMPTS} attempts"
    )))
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        self.users().insert_one(user).await?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "id": id }).await?)
    }

    async fn find_verified_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users()
            .find_one(doc! { "email": email, "status": "verified" })
            .await?)
    }

    async fn find_verified_by_mis(&self, mis: &str) -> Result<Option<User>> {
        Ok(self
            .users()
            .find_one(doc! { "mis": mis, "status": "verified" })
            .await?)
    }

    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .users()
            .find(doc! { "id": { "$in": ids.to_vec() } })
            .await?;
        collect(cursor).await
    }

    async fn find_user_ids_by_name(&self, term: &str) -> Result<Vec<String>> {
        let cursor = self
            .users()
            .find(doc! { "name": case_insensitive(term) })
            .await?;
        Ok(collect(cursor).await?.into_iter().map(|u| u.id).collect())
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self
            .users()
            .find_one(doc! {
                "passwordResetToken": token_hash,
                "passwordResetExpires": { "$gt": timestamp::format(&now) },
            })
            .await?)
    }

    async fn clear_email_otp(&self, id: &str, otp_hash: &str, now: DateTime<Utc>) -> Result<()> {
        self.users()
            .update_one(
                doc! { "id": id, "status": "pending", "emailOtp": otp_hash },
                doc! {
                    "$set": {
                        "emailOtp": null,
                        "emailOtpExpires": null,
                        "updatedAt": timestamp::format(&now),
                    }
                },
            )
            .await?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: &str,
        token_hash: &str,
        expires: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.users()
            .update_one(
                doc! { "id": id },
                doc! {
                    "$set": {
                        "passwordResetToken": token_hash,
                        "passwordResetExpires": timestamp::format(&expires),
                        "updatedAt": timestamp::format(&now),
                    }
                },
            )
            .await?;
        Ok(())
    }

    async fn clear_reset_token(&self, id: &str, token_hash: &str, now: DateTime<Utc>) -> Result<()> {
        self.users()
            .update_one(
                doc! { "id": id, "passwordResetToken": token_hash },
                doc! {
                    "$set": {
                        "passwordResetToken": null,
                        "passwordResetExpires": null,
                        "updatedAt": timestamp::format(&now),
                    }
                },
            )
            .await?;
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        token_hash: &str,
        password_hash: &str,
        changed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let now = timestamp::format(&now);
        Ok(self
            .users()
            .find_one_and_update(
                doc! {
                    "passwordResetToken": token_hash,
                    "passwordResetExpires": { "$gt": &now },
                },
                doc! {
                    "$set": {
                        "passwordHash": password_hash,
                        "passwordResetToken": null,
                        "passwordResetExpires": null,
                        "passwordChangedAt": timestamp::format(&changed_at),
                        "updatedAt": &now,
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn set_profile_pic(
        &self,
        id: &str,
        profile_pic: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        Ok(self
            .users()
            .find_one_and_update(
                doc! { "id": id },
                doc! {
                    "$set": {
                        "profilePic": profile_pic,
                        "updatedAt": timestamp::format(&now),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn verify_pending_user(
        &self,
        id: &str,
        otp_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let now = timestamp::format(&now);
        let verified = self
            .users()
            .find_one_and_update(
                doc! {
                    "id": id,
                    "status": "pending",
                    "emailOtp": otp_hash,
                    "emailOtpExpires": { "$gt": &now },
                },
                doc! {
                    "$set": {
                        "status": "verified",
                        "emailOtp": null,
                        "emailOtpExpires": null,
                        "updatedAt": &now,
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await;

        match verified {
            Ok(user) => Ok(user),
            Err(e) => match duplicate_key_message(&e) {
                Some(message) => Err(duplicate_account(message)),
                None => Err(e.into()),
            },
        }
    }

    async fn purge_unverified(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = self
            .users()
            .delete_many(doc! {
                "status": "pending",
                "$or": [
                    { "emailOtpExpires": { "$lte": timestamp::format(&now) } },
                    { "emailOtpExpires": null },
                ]
            })
            .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl BlogStore for MongoStore {
    async fn insert_blog(&self, blog: &Blog) -> Result<()> {
        self.blogs().insert_one(blog).await?;
        Ok(())
    }

    async fn find_blog(&self, id: &str) -> Result<Option<Blog>> {
        Ok(self.blogs().find_one(doc! { "id": id }).await?)
    }

    async fn record_view(&self, id: &str) -> Result<Option<Blog>> {
        Ok(self
            .blogs()
            .find_one_and_update(doc! { "id": id }, doc! { "$inc": { "viewsCount": 1_i64 } })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn list_blogs(&self, filter: &BlogFilter, sort: &[SortKey], page: Page) -> Result<Vec<Blog>> {
        let cursor = self
            .blogs()
            .find(blog_filter_document(filter))
            .sort(sort_document(sort))
            .skip(page.skip())
            .limit(i64::from(page.limit))
            .await?;
        collect(cursor).await
    }

    async fn count_blogs(&self, filter: &BlogFilter) -> Result<u64> {
        Ok(self
            .blogs()
            .count_documents(blog_filter_document(filter))
            .await?)
    }

    async fn update_blog(&self, id: &str, patch: &BlogPatch, now: DateTime<Utc>) -> Result<Option<Blog>> {
        let mut set = doc! { "updatedAt": timestamp::format(&now) };
        if let Some(title) = &patch.title {
            set.insert("title", title.as_str());
        }
        if let Some(content) = &patch.content {
            set.insert("content", content.as_str());
        }
        if let Some(tags) = &patch.tags {
            set.insert("tags", tags.clone());
        }

        Ok(self
            .blogs()
            .find_one_and_update(doc! { "id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_blog(&self, id: &str) -> Result<bool> {
        let result = self.blogs().delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl CommentStore for MongoStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.comments().insert_one(comment).await?;
        Ok(())
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.comments().find_one(doc! { "id": id }).await?)
    }

    async fn comments_for_blog(&self, blog_id: &str, sort: &[SortKey]) -> Result<Vec<Comment>> {
        let cursor = self
            .comments()
            .find(doc! { "blog": blog_id })
            .sort(sort_document(sort))
            .await?;
        collect(cursor).await
    }

    async fn update_comment_content(
        &self,
        id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>> {
        Ok(self
            .comments()
            .find_one_and_update(
                doc! { "id": id },
                doc! { "$set": { "content": content, "updatedAt": timestamp::format(&now) } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_comment(&self, id: &str) -> Result<bool> {
        let result = self.comments().delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl LikeStore for MongoStore {
    async fn toggle_like(&self, target: LikeTarget, id: &str, user_id: &str) -> Result<Option<LikeOutcome>> {
        match target {
            LikeTarget::Blog => toggle_in(&self.blogs(), id, user_id).await,
            LikeTarget::Comment => toggle_in(&self.comments(), id, user_id).await,
        }
    }
}
