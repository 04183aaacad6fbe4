use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use academix::models::{CreateCommentRequest, LikeTarget, UpdateCommentRequest};

use crate::error::ApiError;
use crate::extract::{Body, CurrentUser};
use crate::response::success;
use crate::router::GatewayState;

pub async fn list_comments(
    State(state): State<GatewayState>,
    CurrentUser(_session): CurrentUser,
    Path(blog_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let sort = params.get("sort").map(String::as_str);
    let listing = state.portal.comments.list(&blog_id, sort).await?;

    Ok(Json(json!({
        "status": "success",
        "results": listing.comments.len(),
        "data": listing,
    }))
    .into_response())
}

pub async fn create_comment(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Path(blog_id): Path<String>,
    Body(request): Body<CreateCommentRequest>,
) -> Result<Response, ApiError> {
    let comment = state.portal.comments.create(&session, &blog_id, request).await?;
    Ok(success(StatusCode::CREATED, json!({ "comment": comment })))
}

pub async fn update_comment(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Path((blog_id, comment_id)): Path<(String, String)>,
    Body(request): Body<UpdateCommentRequest>,
) -> Result<Response, ApiError> {
    let comment = state
        .portal
        .comments
        .update(&session, &blog_id, &comment_id, request)
        .await?;
    Ok(success(StatusCode::OK, json!({ "comment": comment })))
}

pub async fn delete_comment(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Path((blog_id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .portal
        .comments
        .delete(&session, &blog_id, &comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_comment(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = state
        .portal
        .engagement
        .like_unlike(&session, LikeTarget::Comment, &id)
        .await?;
    Ok(success(StatusCode::OK, outcome))
}
