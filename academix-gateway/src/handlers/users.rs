use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::debug;

use academix::models::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest, UpdateMeRequest,
    VerifyOtpRequest,
};

use crate::error::ApiError;
use crate::extract::{Body, CurrentUser, SessionToken};
use crate::response::{clearing_token, success, with_token};
use crate::router::GatewayState;

pub async fn register(
    State(state): State<GatewayState>,
    Body(request): Body<SignupRequest>,
) -> Result<Response, ApiError> {
    let auth = state.portal.accounts.signup(request).await?;
    Ok(with_token(StatusCode::OK, auth, state.cookie_max_age()))
}

pub async fn verify_signup_otp(
    State(state): State<GatewayState>,
    SessionToken(token): SessionToken,
    Body(request): Body<VerifyOtpRequest>,
) -> Result<Response, ApiError> {
    let user = state.portal.accounts.verify_otp(&token, &request.otp).await?;
    Ok(clearing_token(json!({
        "status": "success",
        "data": { "user": user },
    })))
}

pub async fn login(
    State(state): State<GatewayState>,
    Body(request): Body<LoginRequest>,
) -> Result<Response, ApiError> {
    let auth = state.portal.accounts.login(request).await?;
    Ok(with_token(StatusCode::OK, auth, state.cookie_max_age()))
}

pub async fn logout() -> Response {
    clearing_token(json!({ "status": "success" }))
}

pub async fn forgot_password(
    State(state): State<GatewayState>,
    Body(request): Body<ForgotPasswordRequest>,
) -> Result<Response, ApiError> {
    state.portal.accounts.forgot_password(request).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Token sent to email!",
    }))
    .into_response())
}

pub async fn reset_password(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
    Body(request): Body<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let auth = state.portal.accounts.reset_password(&token, request).await?;
    Ok(with_token(StatusCode::OK, auth, state.cookie_max_age()))
}

pub async fn me(State(state): State<GatewayState>, CurrentUser(session): CurrentUser) -> Response {
    success(StatusCode::OK, json!({ "user": state.portal.accounts.me(&session) }))
}

pub async fn update_me(
    State(state): State<GatewayState>,
    CurrentUser(session): CurrentUser,
    Body(request): Body<UpdateMeRequest>,
) -> Result<Response, ApiError> {
    let user = state.portal.accounts.update_me(&session, request).await?;
    debug!("Profile of {} updated", user.id);
    Ok(success(StatusCode::OK, json!({ "user": user })))
}

pub async fn name_by_mis(
    State(state): State<GatewayState>,
    Path(mis): Path<String>,
) -> Result<Response, ApiError> {
    let name = state.portal.accounts.name_by_mis(&mis).await?;
    Ok(success(StatusCode::OK, json!({ "name": name })))
}
