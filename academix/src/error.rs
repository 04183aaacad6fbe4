use thiserror::Error;

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Error types surfaced by the portal services
#[derive(Error, Debug)]
pub enum PortalError {
    /// Request failed validation (mismatched passwords, malformed MIS, ...)
    #[error("{0}")]
    BadRequest(String),

    /// Caller is not authenticated or supplied wrong credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is authenticated but may not touch the resource
    #[error("{0}")]
    Forbidden(String),

    /// Referenced document does not exist
    #[error("{0}")]
    NotFound(String),

    /// MongoDB driver errors
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Token signing or verification errors
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Outgoing email could not be delivered
    #[error("Mail delivery error: {0}")]
    Mail(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortalError {
    pub fn bad_request<T: ToString>(message: T) -> Self {
        Self::BadRequest(message.to_string())
    }

    pub fn unauthorized<T: ToString>(message: T) -> Self {
        Self::Unauthorized(message.to_string())
    }

    pub fn forbidden<T: ToString>(message: T) -> Self {
        Self::Forbidden(message.to_string())
    }

    pub fn not_found<T: ToString>(message: T) -> Self {
        Self::NotFound(message.to_string())
    }

    pub fn mail_error<T: ToString>(message: T) -> Self {
        Self::Mail(message.to_string())
    }

    pub fn internal_error<T: ToString>(message: T) -> Self {
        Self::Internal(message.to_string())
    }

    /// Check if the error was caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest(_)
                | Self::Unauthorized(_)
                | Self::Forbidden(_)
                | Self::NotFound(_)
                | Self::Token(_)
        )
    }
}
