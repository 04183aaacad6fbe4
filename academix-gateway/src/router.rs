use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use academix::{Portal, PortalError};

use crate::handlers::{self, blogs, comments, users};

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub portal: Portal,
}

impl GatewayState {
    pub fn cookie_max_age(&self) -> u64 {
        self.portal.settings().jwt.cookie_max_age_seconds
    }
}

/// Build the REST API for a wired-up portal.
///
/// Layout:
/// ```text
/// /api/v1/users     register, verifySignupEmailOTP, login, logout,
///                   forgotPassword, resetPassword/{token}, me, updateMe, mis/{mis}
/// /api/v1/blogs     list, search, CRUD by id, {id}/like
/// /api/v1/comments  {blog}/comments, {blog}/comments/{comment}, {comment}/like
/// ```
pub fn create_router(portal: Portal) -> Result<Router, PortalError> {
    info!("🌐 Creating Academix REST router");

    let cors = cors_layer(&portal.settings().server.frontend_url)?;
    let state = GatewayState { portal };

    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/verifySignupEmailOTP", post(users::verify_signup_otp))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/forgotPassword", post(users::forgot_password))
        .route("/resetPassword/{token}", patch(users::reset_password))
        .route("/me", get(users::me))
        .route("/updateMe", patch(users::update_me))
        .route("/mis/{mis}", get(users::name_by_mis));

    let blog_routes = Router::new()
        .route("/", get(blogs::list_blogs).post(blogs::create_blog))
        .route("/search", get(blogs::search_blogs))
        .route(
            "/{id}",
            get(blogs::get_blog)
                .patch(blogs::update_blog)
                .delete(blogs::delete_blog),
        )
        .route("/{id}/like", patch(blogs::like_blog));

    // one parameter name per segment; `{id}` is a blog id except on /like
    let comment_routes = Router::new()
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/{id}/comments/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/{id}/like", patch(comments::like_comment));

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api-docs/openapi.json", get(handlers::openapi_spec))
        .nest("/api/v1/users", user_routes)
        .nest("/api/v1/blogs", blog_routes)
        .nest("/api/v1/comments", comment_routes)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    info!("✅ Router created");
    Ok(router)
}

/// Cross-origin access for the single-page client, with cookies
fn cors_layer(frontend_url: &str) -> Result<CorsLayer, PortalError> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))
        .map_err(|e| PortalError::internal_error(format!("invalid frontend_url {frontend_url}: {e}")))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]))
}
