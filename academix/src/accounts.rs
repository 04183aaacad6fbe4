use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    generate_otp, generate_reset_token, hash_password, sha256_hex, validate_new_password,
    verify_password, Claims, JwtUtils,
};
use crate::error::{PortalError, Result};
use crate::listing::non_blank;
use crate::mailer::{Mailer, Notification};
use crate::mis::Mis;
use crate::models::{
    AccountStatus, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdateMeRequest, User, UserProfile,
};
use crate::settings::Settings;
use crate::store::Store;

pub(crate) const DUPLICATE_EMAIL: &str = "Duplicate Email Found.";
pub(crate) const DUPLICATE_MIS: &str = "Duplicate MIS Found.";
const MAIL_FAILURE: &str = "There was an error sending the email. Try again later!";

/// A freshly issued session token together with the account it belongs to
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthToken {
    pub token: String,
    pub user: UserProfile,
}

/// The caller of a request, resolved from the token and reloaded from the
/// store. Never cached across requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub claims: Claims,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn is_author_of(&self, author_id: &str) -> bool {
        self.user.id == author_id
    }
}

/// Signup, verification, login and password management
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    jwt: Arc<JwtUtils>,
    settings: Arc<Settings>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, settings: Arc<Settings>) -> Self {
        let jwt = Arc::new(JwtUtils::new(
            &settings.jwt.secret,
            settings.jwt.expiration_hours,
        ));
        Self {
            store,
            mailer,
            jwt,
            settings,
        }
    }

    /// Register a pending account and mail it a one-time code. The returned
    /// token is what `verify_otp` expects.
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthToken> {
        let name = non_blank(Some(request.name.as_str()))
            .ok_or_else(|| PortalError::bad_request("Please tell us your name!"))?;
        let email = normalize_email(&request.email)
            .ok_or_else(|| PortalError::bad_request("Please provide a valid email"))?;
        let mis = Mis::parse(&request.mis)?;
        validate_new_password(&request.password, &request.password_confirm)?;

        if self.store.find_verified_by_email(&email).await?.is_some() {
            return Err(PortalError::unauthorized(DUPLICATE_EMAIL));
        }
        if self.store.find_verified_by_mis(mis.as_str()).await?.is_some() {
            return Err(PortalError::unauthorized(DUPLICATE_MIS));
        }

        let otp = generate_otp();
        let otp_hash = sha256_hex(&otp);
        let now = Utc::now();
        let ttl = self.settings.auth.otp_ttl_minutes;
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            mis: mis.into_inner(),
            password_hash: hash_password(&request.password, self.settings.auth.bcrypt_cost).await?,
            profile_pic: non_blank(request.profile_pic.as_deref()),
            status: AccountStatus::Pending,
            email_otp: Some(otp_hash.clone()),
            email_otp_expires: Some(now + Duration::minutes(ttl)),
            password_reset_token: None,
            password_reset_expires: None,
            password_changed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;
        info!("📝 New pending account {} ({})", user.id, user.email);

        let notification = Notification::SignupOtp {
            to: user.email.clone(),
            name: user.name.clone(),
            code: otp,
            expires_in_minutes: ttl,
        };
        if let Err(e) = self.mailer.send(notification).await {
            warn!("Signup OTP for {} could not be sent: {}", user.id, e);
            self.store.clear_email_otp(&user.id, &otp_hash, Utc::now()).await?;
            return Err(PortalError::mail_error(MAIL_FAILURE));
        }

        self.issue(&user)
    }

    /// Confirm the signup code. The token is the one returned by `signup`.
    pub async fn verify_otp(&self, token: &str, otp: &str) -> Result<UserProfile> {
        let claims = self.decode(token)?;
        let otp = non_blank(Some(otp)).ok_or_else(|| PortalError::bad_request("Please provide the OTP"))?;

        let user = self
            .store
            .find_user(&claims.id)
            .await?
            .ok_or_else(|| PortalError::unauthorized("The user belonging to this token no longer exists."))?;
        if user.is_verified() {
            return Err(PortalError::bad_request("This account is already verified"));
        }

        // another pending signup for the same address may have won the race
        if self.store.find_verified_by_email(&user.email).await?.is_some() {
            return Err(PortalError::unauthorized(DUPLICATE_EMAIL));
        }
        if self.store.find_verified_by_mis(&user.mis).await?.is_some() {
            return Err(PortalError::unauthorized(DUPLICATE_MIS));
        }

        let verified = self
            .store
            .verify_pending_user(&user.id, &sha256_hex(&otp), Utc::now())
            .await?
            .ok_or_else(|| PortalError::unauthorized("OTP is invalid or has expired"))?;

        info!("✅ Account {} verified", verified.id);
        Ok(verified.to_profile())
    }

    /// Log in with an email address or a MIS id
    pub async fn login(&self, request: LoginRequest) -> Result<AuthToken> {
        let (Some(userkey), Some(password)) = (
            non_blank(request.userkey.as_deref()),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(PortalError::bad_request("Please provide email and password!"));
        };

        let incorrect = || PortalError::unauthorized("Incorrect email or password");
        let user = self.find_by_userkey(&userkey).await?.ok_or_else(incorrect)?;
        if !verify_password(&password, &user.password_hash).await? {
            return Err(incorrect());
        }

        debug!("User {} logged in", user.id);
        self.issue(&user)
    }

    /// Store a reset token digest and mail the raw token as a link
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<()> {
        let userkey = non_blank(request.userkey.as_deref())
            .ok_or_else(|| PortalError::bad_request("Please provide your email or MIS"))?;
        let user = self
            .find_by_userkey(&userkey)
            .await?
            .ok_or_else(|| PortalError::not_found("There is no user with email address."))?;

        let token = generate_reset_token();
        let token_hash = sha256_hex(&token);
        let ttl = self.settings.auth.reset_ttl_minutes;
        let now = Utc::now();
        self.store
            .set_reset_token(&user.id, &token_hash, now + Duration::minutes(ttl), now)
            .await?;

        let notification = Notification::PasswordReset {
            to: user.email.clone(),
            name: user.name.clone(),
            reset_url: self.reset_url(&token),
            expires_in_minutes: ttl,
        };
        if let Err(e) = self.mailer.send(notification).await {
            warn!("Reset link for {} could not be sent: {}", user.id, e);
            self.store.clear_reset_token(&user.id, &token_hash, Utc::now()).await?;
            return Err(PortalError::mail_error(MAIL_FAILURE));
        }

        info!("🔑 Password reset requested for {}", user.id);
        Ok(())
    }

    /// Set a new password with an unexpired reset token and log the user in
    pub async fn reset_password(&self, token: &str, request: ResetPasswordRequest) -> Result<AuthToken> {
        let token_hash = sha256_hex(token);
        let invalid = || PortalError::bad_request("Token is invalid or has expired");
        self.store
            .find_by_reset_token(&token_hash, Utc::now())
            .await?
            .ok_or_else(invalid)?;

        validate_new_password(&request.password, &request.password_confirm)?;
        let password_hash = hash_password(&request.password, self.settings.auth.bcrypt_cost).await?;

        let now = Utc::now();
        // one second back so the token issued below is not already stale
        let user = self
            .store
            .complete_password_reset(&token_hash, &password_hash, now - Duration::seconds(1), now)
            .await?
            .ok_or_else(invalid)?;

        info!("🔑 Password reset for {}", user.id);
        self.issue(&user)
    }

    /// Resolve a bearer token into a session for a verified, current user
    pub async fn authenticate(&self, token: &str) -> Result<Session> {
        let claims = self.decode(token)?;

        let user = self
            .store
            .find_user(&claims.id)
            .await?
            .ok_or_else(|| PortalError::unauthorized("The user belonging to this token no longer exists."))?;
        if !user.is_verified() {
            return Err(PortalError::unauthorized(
                "Please verify your email before continuing.",
            ));
        }
        if user.password_changed_after(claims.iat) {
            return Err(PortalError::unauthorized(
                "User recently changed password! Please log in again.",
            ));
        }

        Ok(Session { user, claims })
    }

    pub fn me(&self, session: &Session) -> UserProfile {
        session.user.to_profile()
    }

    pub async fn update_me(&self, session: &Session, request: UpdateMeRequest) -> Result<UserProfile> {
        let profile_pic = non_blank(request.profile_pic.as_deref());
        let user = self
            .store
            .set_profile_pic(session.user_id(), profile_pic.as_deref(), Utc::now())
            .await?
            .ok_or_else(|| PortalError::unauthorized("The user belonging to this token no longer exists."))?;
        Ok(user.to_profile())
    }

    /// Display name of the verified user with this MIS id
    pub async fn name_by_mis(&self, mis: &str) -> Result<String> {
        self.store
            .find_verified_by_mis(mis.trim())
            .await?
            .map(|user| user.name)
            .ok_or_else(|| PortalError::not_found(format!("No user found with MIS: {}", mis.trim())))
    }

    async fn find_by_userkey(&self, userkey: &str) -> Result<Option<User>> {
        if let Some(email) = normalize_email(userkey) {
            if let Some(user) = self.store.find_verified_by_email(&email).await? {
                return Ok(Some(user));
            }
        }
        if !Mis::looks_like(userkey) {
            return Ok(None);
        }
        self.store.find_verified_by_mis(userkey.trim()).await
    }

    fn decode(&self, token: &str) -> Result<Claims> {
        self.jwt.validate_token(token).map_err(|e| {
            debug!("Rejected token: {}", e);
            PortalError::unauthorized("Invalid token. Please log in again!")
        })
    }

    fn issue(&self, user: &User) -> Result<AuthToken> {
        Ok(AuthToken {
            token: self.jwt.create_token(user)?,
            user: user.to_profile(),
        })
    }

    fn reset_url(&self, token: &str) -> String {
        format!(
            "{}/reset-password/{}",
            self.settings.server.frontend_url.trim_end_matches('/'),
            token
        )
    }
}

fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Some(email),
        _ => None,
    }
}
