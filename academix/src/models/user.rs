use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::timestamp;

/// Whether the account's email address has been confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Signed up, OTP not yet confirmed
    Pending,
    /// OTP confirmed; the account can log in
    Verified,
}

/// Internal User document (never sent to clients as-is)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mis: String,
    pub password_hash: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
    pub status: AccountStatus,
    /// SHA-256 hex digest of the signup OTP
    #[serde(default)]
    pub email_otp: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub email_otp_expires: Option<DateTime<Utc>>,
    /// SHA-256 hex digest of the password reset token
    #[serde(default)]
    pub password_reset_token: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub password_reset_expires: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_verified(&self) -> bool {
        self.status == AccountStatus::Verified
    }

    /// True when the password was changed after a token issued at `issued_at`
    /// (seconds since the epoch)
    pub fn password_changed_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .map(|changed| changed.timestamp() > issued_at)
            .unwrap_or(false)
    }

    /// Convert internal User to external UserProfile (removes secrets)
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            mis: self.mis.clone(),
            profile_pic: self.profile_pic.clone(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Public user profile (safe for external consumption)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mis: String,
    pub profile_pic: Option<String>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

/// Author reference embedded into blog and comment views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthorSummary {
    pub fn from_user(user: &User, with_email: bool) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: with_email.then(|| user.email.clone()),
        }
    }

    /// Placeholder for an author whose account no longer exists
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: "[deleted]".to_string(),
            email: None,
        }
    }
}
