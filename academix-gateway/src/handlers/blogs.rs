use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use academix::listing::project_fields;
use academix::models::{CreateBlogRequest, LikeTarget, UpdateBlogRequest};
use academix::{BlogListQuery, BlogPage, BlogSearchQuery};

use crate::error::ApiError;
use crate::extract::{Body, CurrentUser};
use crate::response::success;
use crate::router::GatewayState;

pub async fn list_blogs(
    State(state): State<GatewayState>,
    CurrentUser(_session): CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = BlogListQuery::from_params(&params)?;
    let page = state.portal.blogs.list(&query).await?;
    page_response(page, query.fields.as_deref())
}

pub async fn search_blogs(
    State(state): State<GatewayState>,
    CurrentUser(_session): CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = BlogSearchQuery::from_params(&params)?;
    let page = state.portal.blogs.search(&query).await?;
    page_response(page, None)
}

pub async fn create_blog(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Body(request): Body<CreateBlogRequest>,
) -> Result<Response, ApiError> {
    let blog = state.portal.blogs.create(&session, request).await?;
    Ok(success(StatusCode::CREATED, json!({ "blog": blog })))
}

pub async fn get_blog(
    State(state): State<GatewayState>,
    CurrentUser(_session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let blog = state.portal.blogs.get(&id).await?;
    Ok(success(StatusCode::OK, json!({ "blog": blog })))
}

pub async fn update_blog(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Body(request): Body<UpdateBlogRequest>,
) -> Result<Response, ApiError> {
    let blog = state.portal.blogs.update(&session, &id, request).await?;
    Ok(success(StatusCode::OK, json!({ "blog": blog })))
}

pub async fn delete_blog(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.portal.blogs.delete(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_blog(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = state
        .portal
        .engagement
        .like_unlike(&session, LikeTarget::Blog, &id)
        .await?;
    Ok(success(StatusCode::OK, outcome))
}

fn page_response(page: BlogPage, fields: Option<&[String]>) -> Result<Response, ApiError> {
    let mut blogs = Vec::with_capacity(page.blogs.len());
    for blog in &page.blogs {
        let value = serde_json::to_value(blog).map_err(academix::PortalError::from)?;
        blogs.push(match fields {
            Some(fields) => project_fields(value, fields),
            None => value,
        });
    }

    Ok(Json(json!({
        "status": "success",
        "results": blogs.len(),
        "totalCount": page.total_count,
        "data": { "blogs": Value::Array(blogs) },
    }))
    .into_response())
}
