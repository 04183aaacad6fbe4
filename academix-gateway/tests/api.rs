use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use academix::{MemoryStore, Portal, RecordingMailer, Settings, StoreBackend};
use academix_gateway::create_router;

struct TestApp {
    router: Router,
    mailer: Arc<RecordingMailer>,
}

fn app() -> TestApp {
    let mut settings = Settings::from_defaults().unwrap();
    settings.database.backend = StoreBackend::Memory;
    settings.auth.bcrypt_cost = 4;
    settings.sweep.enabled = false;

    let mailer = Arc::new(RecordingMailer::new());
    let portal = Portal::new(settings, Arc::new(MemoryStore::new()), mailer.clone());
    TestApp {
        router: create_router(portal).unwrap(),
        mailer,
    }
}

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

async fn call(app: &TestApp, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

async fn send(app: &TestApp, request: Request<Body>) -> Reply {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        set_cookie,
        body,
    }
}

/// Register and verify an account, returning its token
async fn verified_user(app: &TestApp, name: &str, email: &str, mis: &str) -> String {
    let signup = call(
        app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "pass1234",
            "passwordConfirm": "pass1234",
            "mis": mis,
        })),
    )
    .await;
    assert_eq!(signup.status, StatusCode::OK);
    let token = signup.body["token"].as_str().unwrap().to_string();

    let otp = app.mailer.last_otp_for(email).await.unwrap();
    let verified = call(
        app,
        Method::POST,
        "/api/v1/users/verifySignupEmailOTP",
        Some(&token),
        Some(json!({ "Emailotp": otp })),
    )
    .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["data"]["user"]["status"], "verified");
    token
}

async fn create_blog(app: &TestApp, token: &str, title: &str, tags: &[&str]) -> String {
    let created = call(
        app,
        Method::POST,
        "/api/v1/blogs",
        Some(token),
        Some(json!({ "title": title, "content": "<p>body</p>", "tags": tags })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    created.body["data"]["blog"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_signup_verify_and_login() {
    let app = app();
    verified_user(&app, "Asha Patil", "asha@example.com", "612303042").await;

    let login = call(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "userkey": "612303042", "password": "pass1234" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["status"], "success");
    assert_eq!(login.body["data"]["user"]["email"], "asha@example.com");
    let cookie = login.set_cookie.unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    // the cookie alone authenticates
    let cookie_pair = cookie.split(';').next().unwrap().to_string();
    let me = send(
        &app,
        Request::builder()
            .uri("/api/v1/users/me")
            .header(header::COOKIE, cookie_pair)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["user"]["name"], "Asha Patil");

    let name = call(&app, Method::GET, "/api/v1/users/mis/612303042", None, None).await;
    assert_eq!(name.status, StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = app();
    verified_user(&app, "Asha Patil", "asha@example.com", "612303042").await;

    let login = call(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "userkey": "asha@example.com", "password": "nope12345" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login.body["status"], "fail");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = app();
    let reply = call(&app, Method::GET, "/api/v1/blogs", None, None).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        reply.body,
        json!({
            "status": "fail",
            "message": "You are not logged in! Please log in to get access.",
        })
    );
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = app();
    let reply = call(&app, Method::GET, "/api/v1/users/me", Some("not-a-jwt"), None).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "Invalid token. Please log in again!");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app();
    let reply = call(&app, Method::GET, "/api/v1/nowhere", None, None).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["message"], "Can't find /api/v1/nowhere on this server!");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let reply = send(&app, request).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["status"], "fail");
}

#[tokio::test]
async fn test_blog_lifecycle() {
    let app = app();
    let asha = verified_user(&app, "Asha Patil", "asha@example.com", "612303042").await;
    let ravi = verified_user(&app, "Ravi Kumar", "ravi@example.com", "612304017").await;

    let limits = create_blog(&app, &asha, "Limits", &["Math"]).await;
    create_blog(&app, &asha, "Optics", &["physics"]).await;

    let math = call(&app, Method::GET, "/api/v1/blogs?tags=math", Some(&ravi), None).await;
    assert_eq!(math.status, StatusCode::OK);
    assert_eq!(math.body["results"], 1);
    assert_eq!(math.body["totalCount"], 1);
    assert_eq!(math.body["data"]["blogs"][0]["id"], limits.as_str());

    let uri = format!("/api/v1/blogs/{limits}");
    call(&app, Method::GET, &uri, Some(&ravi), None).await;
    let viewed = call(&app, Method::GET, &uri, Some(&ravi), None).await;
    assert_eq!(viewed.body["data"]["blog"]["viewsCount"], 2);

    let like_uri = format!("/api/v1/blogs/{limits}/like");
    let liked = call(&app, Method::PATCH, &like_uri, Some(&ravi), None).await;
    assert_eq!(liked.body["data"], json!({ "likesCount": 1, "userLiked": true }));
    let unliked = call(&app, Method::PATCH, &like_uri, Some(&ravi), None).await;
    assert_eq!(unliked.body["data"], json!({ "likesCount": 0, "userLiked": false }));

    let hijack = call(
        &app,
        Method::PATCH,
        &uri,
        Some(&ravi),
        Some(json!({ "title": "Mine now" })),
    )
    .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let deleted = call(&app, Method::DELETE, &uri, Some(&asha), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = call(&app, Method::GET, &uri, Some(&asha), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["message"], "No blog found with that ID");
}

#[tokio::test]
async fn test_comment_thread_survives_parent_delete() {
    let app = app();
    let asha = verified_user(&app, "Asha Patil", "asha@example.com", "612303042").await;
    let ravi = verified_user(&app, "Ravi Kumar", "ravi@example.com", "612304017").await;
    let blog = create_blog(&app, &asha, "Limits", &["math"]).await;
    let comments_uri = format!("/api/v1/comments/{blog}/comments");

    let question = call(
        &app,
        Method::POST,
        &comments_uri,
        Some(&ravi),
        Some(json!({ "content": "Why epsilon?" })),
    )
    .await;
    assert_eq!(question.status, StatusCode::CREATED);
    let question_id = question.body["data"]["comment"]["id"].as_str().unwrap().to_string();

    let answer = call(
        &app,
        Method::POST,
        &comments_uri,
        Some(&asha),
        Some(json!({ "content": "Because delta.", "parentComment": question_id })),
    )
    .await;
    assert_eq!(answer.status, StatusCode::CREATED);
    let answer_id = answer.body["data"]["comment"]["id"].as_str().unwrap().to_string();

    let like = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/comments/{answer_id}/like"),
        Some(&ravi),
        None,
    )
    .await;
    assert_eq!(like.body["data"]["likesCount"], 1);

    let listing = call(&app, Method::GET, &comments_uri, Some(&ravi), None).await;
    assert_eq!(listing.body["results"], 2);
    assert_eq!(listing.body["data"]["thread"]["roots"][0]["replies"][0]["id"], answer_id.as_str());

    let not_yours = call(
        &app,
        Method::DELETE,
        &format!("{comments_uri}/{question_id}"),
        Some(&asha),
        None,
    )
    .await;
    assert_eq!(not_yours.status, StatusCode::FORBIDDEN);

    let deleted = call(
        &app,
        Method::DELETE,
        &format!("{comments_uri}/{question_id}"),
        Some(&ravi),
        None,
    )
    .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let listing = call(&app, Method::GET, &comments_uri, Some(&ravi), None).await;
    assert_eq!(listing.body["results"], 1);
    assert!(listing.body["data"]["thread"]["roots"].as_array().unwrap().is_empty());
    assert_eq!(listing.body["data"]["thread"]["orphans"][0]["id"], answer_id.as_str());
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = app();
    let health = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(health.body["status"], "healthy");

    let doc = call(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(doc.status, StatusCode::OK);
    assert!(doc.body["components"]["schemas"]["CommentView"].is_object());
}
