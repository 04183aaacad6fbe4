pub mod blogs;
pub mod comments;
pub mod users;

use axum::http::Uri;
use axum::response::Json;
use serde_json::{json, Value};
use utoipa::OpenApi;

use crate::error::ApiError;
use crate::openapi::ApiDoc;

pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Academix API is running",
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "academix-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::RouteNotFound(uri.path().to_string())
}
