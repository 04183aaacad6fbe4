use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use academix::PortalError;

const GENERIC_FAILURE: &str = "Something went very wrong!";

/// Everything a handler can fail with, rendered as `{status, message}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// The request body could not be decoded
    #[error("{0}")]
    Malformed(String),

    #[error("You are not logged in! Please log in to get access.")]
    NotLoggedIn,

    #[error("Can't find {0} on this server!")]
    RouteNotFound(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Portal(err) => match err {
                PortalError::BadRequest(_) => StatusCode::BAD_REQUEST,
                PortalError::Unauthorized(_) | PortalError::Token(_) => StatusCode::UNAUTHORIZED,
                PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
                PortalError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message shown to the client. Server-side failures are logged and
    /// replaced, except mail failures which carry a user-facing message.
    fn public_message(&self) -> String {
        match self {
            Self::Portal(PortalError::Mail(message)) => {
                error!("Mail delivery failed: {}", message);
                message.clone()
            }
            Self::Portal(PortalError::Token(_)) => "Invalid token. Please log in again!".to_string(),
            Self::Portal(err) if !err.is_client_error() => {
                error!("Request failed: {}", err);
                GENERIC_FAILURE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "status": if status.is_server_error() { "error" } else { "fail" },
            "message": self.public_message(),
        });

        (status, Json(body)).into_response()
    }
}
