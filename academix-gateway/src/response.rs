//! Success envelopes and the session cookie.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{json, Value};

use academix::AuthToken;

use crate::extract::TOKEN_COOKIE;

/// `{status: "success", data}`
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "status": "success", "data": data }))).into_response()
}

/// Token in both the body and an `HttpOnly` cookie
pub fn with_token(status: StatusCode, auth: AuthToken, cookie_max_age_seconds: u64) -> Response {
    let body = json!({
        "status": "success",
        "token": auth.token,
        "data": { "user": auth.user },
    });
    let cookie = format!(
        "{TOKEN_COOKIE}={}; Max-Age={cookie_max_age_seconds}; Path=/; HttpOnly; Secure; SameSite=None",
        auth.token
    );
    attach_cookie((status, Json(body)).into_response(), &cookie)
}

/// Expire the token cookie
pub fn clearing_token(body: Value) -> Response {
    let cookie = format!("{TOKEN_COOKIE}=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=None");
    attach_cookie((StatusCode::OK, Json(body)).into_response(), &cookie)
}

fn attach_cookie(mut response: Response, cookie: &str) -> Response {
    // tokens are base64url and ids are ascii, so the header is always valid
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}
