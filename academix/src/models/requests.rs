use serde::Deserialize;
use utoipa::ToSchema;

/// Request to register a new account
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub mis: String,
    pub profile_pic: Option<String>,
}

/// Request to confirm the signup OTP
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyOtpRequest {
    #[serde(rename = "Emailotp", alias = "otp")]
    pub otp: String,
}

/// Request to log in with an email address or a MIS id
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub userkey: Option<String>,
    pub password: Option<String>,
}

/// Request a password reset link
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub userkey: Option<String>,
}

/// Set a new password using a reset token
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

/// Profile fields a user may change on their own account
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateMeRequest {
    pub profile_pic: Option<String>,
}

/// Request to create a new blog
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Request to update an existing blog
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Request to create a comment, optionally as a reply
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_comment: Option<String>,
}

/// Request to update a comment
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}
