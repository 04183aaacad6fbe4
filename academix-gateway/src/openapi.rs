use utoipa::OpenApi;

use academix::models::{
    AccountStatus, AuthorSummary, BlogView, CommentView, CreateBlogRequest, CreateCommentRequest,
    ForgotPasswordRequest, LikeOutcome, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdateBlogRequest, UpdateCommentRequest, UpdateMeRequest, UserProfile, VerifyOtpRequest,
};
use academix::{AuthToken, BlogPage};

#[derive(OpenApi)]
#[openapi(
    components(schemas(
        // Accounts
        AccountStatus,
        UserProfile,
        AuthToken,
        SignupRequest,
        VerifyOtpRequest,
        LoginRequest,
        ForgotPasswordRequest,
        ResetPasswordRequest,
        UpdateMeRequest,

        // Blogs
        AuthorSummary,
        BlogView,
        BlogPage,
        CreateBlogRequest,
        UpdateBlogRequest,

        // Comments
        CommentView,
        CreateCommentRequest,
        UpdateCommentRequest,

        // Engagement
        LikeOutcome,
    )),
    tags(
        (name = "users", description = "Signup, OTP verification, login and password reset"),
        (name = "blogs", description = "Blogs with tags, search, views and likes"),
        (name = "comments", description = "Threaded comments and comment likes"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Academix Student Portal API",
        version = "0.1.0",
        description = "REST API of the Academix student portal",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8001", description = "Local development server")
    )
)]
pub struct ApiDoc;
