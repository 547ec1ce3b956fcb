use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use theca::api::AppState;
use theca::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.mail.api_key = None;
    config.server.secure_cookies = false;

    let state = theca::api::create_app_state(config)
        .await
        .expect("Failed to create app state");
    (theca::api::router(state.clone()), state)
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: &Value,
    cookie: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, format!("session_id={cookie}"));
    }

    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, format!("session_id={cookie}"));
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_cookie(response: &Response) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let value = raw.strip_prefix("session_id=")?;
    let value = value.split(';').next()?;
    (!value.is_empty()).then(|| value.to_string())
}

/// Registers and verifies an account, returning a live session cookie.
async fn register_and_login(
    app: &Router,
    state: &Arc<AppState>,
    email: &str,
    username: &str,
    password: &str,
) -> String {
    let response = send_json(
        app,
        "POST",
        "/user/register",
        &json!({"email": email, "username": username, "password": password}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let code = state
        .store
        .get_user_by_username(username)
        .await
        .unwrap()
        .unwrap()
        .verification_code
        .expect("new account should have a verification code");

    let response = send_json(app, "POST", "/user/verify-email", &json!({"code": code}), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        app,
        "POST",
        "/user/login",
        &json!({"username": username, "password": password}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    session_cookie(&response).expect("login should set a session cookie")
}

#[tokio::test]
async fn test_register_verify_login_flow() {
    let (app, state) = spawn_app().await;

    let response = send_json(
        &app,
        "POST",
        "/user/register",
        &json!({"email": "alice@example.com", "username": "alice", "password": "hunter2hunter2"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Login before verification is refused and must not hand out a session.
    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "alice", "password": "hunter2hunter2"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    let body = body_json(response).await;
    assert_eq!(body["code"], "EMAIL_NOT_VERIFIED");

    let code = state
        .store
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap()
        .verification_code
        .unwrap();

    let response =
        send_json(&app, "POST", "/user/verify-email", &json!({"code": code}), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "alice", "password": "hunter2hunter2"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();

    let response = get(&app, "/api/user/verification-status", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], true);
}

#[tokio::test]
async fn test_register_conflicts() {
    let (app, state) = spawn_app().await;
    register_and_login(&app, &state, "bob@example.com", "bob", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/user/register",
        &json!({"email": "bob@example.com", "username": "other", "password": "password123"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "EMAIL_EXISTS");

    let response = send_json(
        &app,
        "POST",
        "/user/register",
        &json!({"email": "other@example.com", "username": "bob", "password": "password123"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "USERNAME_EXISTS");
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _state) = spawn_app().await;

    let response = send_json(
        &app,
        "POST",
        "/user/register",
        &json!({"email": "not-an-email", "username": "carol", "password": "password123"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(
        &app,
        "POST",
        "/user/register",
        &json!({"email": "carol@example.com", "username": "carol", "password": "short"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed body (missing fields) is a 400 with INVALID_BODY.
    let response = send_json(&app, "POST", "/user/register", &json!({"email": "x"}), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_BODY");
}

#[tokio::test]
async fn test_verify_email_wrong_code() {
    let (app, _state) = spawn_app().await;

    let response =
        send_json(&app, "POST", "/user/verify-email", &json!({"code": "000001"}), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "INVALID_VERIFICATION_CODE");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (app, _state) = spawn_app().await;

    // No cookie at all.
    let response = get(&app, "/api/bookmarks/get", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "MISSING_SESSION");

    // A cookie that resolves to nothing.
    let response = get(&app, "/api/bookmarks/get", Some("not-a-real-session")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_and_expired_sessions_are_indistinguishable() {
    let (app, state) = spawn_app().await;
    register_and_login(&app, &state, "dave@example.com", "dave", "password123").await;

    let user = state
        .store
        .get_user_by_username("dave")
        .await
        .unwrap()
        .unwrap();
    let expired = chrono::Utc::now() - chrono::Duration::hours(1);
    state
        .store
        .create_session("expired-session", user.id, expired)
        .await
        .unwrap();

    let unknown = get(&app, "/api/bookmarks/get", Some("never-existed")).await;
    let stale = get(&app, "/api/bookmarks/get", Some("expired-session")).await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(unknown).await, body_json(stale).await);
}

#[tokio::test]
async fn test_login_with_live_session_conflicts() {
    let (app, state) = spawn_app().await;
    let cookie = register_and_login(&app, &state, "erin@example.com", "erin", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "erin", "password": "password123"}),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "USER_ALREADY_LOGGED");

    // A stale cookie is ignored and login proceeds.
    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "erin", "password": "password123"}),
        Some("long-gone-session"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, state) = spawn_app().await;
    register_and_login(&app, &state, "finn@example.com", "finn", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "finn", "password": "wrongpassword"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_PASSWORD");
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let (app, state) = spawn_app().await;
    let cookie = register_and_login(&app, &state, "gail@example.com", "gail", "password123").await;

    let response = send_json(&app, "DELETE", "/api/user/logout", &json!({}), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = session_cookie(&response);
    assert!(cleared.is_none(), "logout must clear the cookie");

    let response = get(&app, "/api/bookmarks/get", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_revokes_sessions() {
    let (app, state) = spawn_app().await;
    let cookie = register_and_login(&app, &state, "hank@example.com", "hank", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/api/user/change-pass",
        &json!({"password": "newpassword456"}),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The session that made the request is gone too.
    let response = get(&app, "/api/bookmarks/get", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "hank", "password": "password123"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "hank", "password": "newpassword456"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let (app, state) = spawn_app().await;
    let cookie = register_and_login(&app, &state, "iris@example.com", "iris", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/user/password-reset/request",
        &json!({"email": "iris@example.com"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = state
        .store
        .get_user_by_username("iris")
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .expect("reset request should store a token");
    assert_eq!(token.len(), 64);

    let response = send_json(
        &app,
        "POST",
        "/user/password-reset/reset",
        &json!({"token": token, "password": "resetpassword789"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Reset revokes every existing session.
    let response = get(&app, "/api/bookmarks/get", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The token is single-use.
    let response = send_json(
        &app,
        "POST",
        "/user/password-reset/reset",
        &json!({"token": token, "password": "anotherpassword"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send_json(
        &app,
        "POST",
        "/user/login",
        &json!({"username": "iris", "password": "resetpassword789"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_reset_token() {
    let (app, state) = spawn_app().await;
    register_and_login(&app, &state, "jack@example.com", "jack", "password123").await;

    let user = state
        .store
        .get_user_by_username("jack")
        .await
        .unwrap()
        .unwrap();
    let expired = chrono::Utc::now() - chrono::Duration::hours(1);
    state
        .store
        .set_user_reset_token(user.id, "a".repeat(64).as_str(), expired)
        .await
        .unwrap();

    let response = send_json(
        &app,
        "POST",
        "/user/password-reset/reset",
        &json!({"token": "a".repeat(64), "password": "whateverpass1"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "EXPIRED_TOKEN");
}

#[tokio::test]
async fn test_bookmark_crud() {
    let (app, state) = spawn_app().await;
    let cookie = register_and_login(&app, &state, "kate@example.com", "kate", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/api/bookmarks/create",
        &json!({"title": "Example", "url": "https://example.invalid/page", "show_text": true}),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["title"], "Example");

    let response = get(&app, "/api/bookmarks/get", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = send_json(
        &app,
        "POST",
        "/api/bookmarks/update",
        &json!({
            "id": id,
            "title": "Renamed",
            "url": "https://example.invalid/other",
            "show_text": false
        }),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["show_text"], false);

    let response = send_json(
        &app,
        "DELETE",
        "/api/bookmarks/delete",
        &json!({"id": id}),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/api/bookmarks/get", Some(&cookie)).await;
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bookmark_quota() {
    let (app, state) = spawn_app().await;
    let cookie = register_and_login(&app, &state, "liam@example.com", "liam", "password123").await;

    for i in 0..25 {
        let response = send_json(
            &app,
            "POST",
            "/api/bookmarks/create",
            &json!({
                "title": format!("Bookmark {i}"),
                "url": format!("https://example.invalid/{i}")
            }),
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send_json(
        &app,
        "POST",
        "/api/bookmarks/create",
        &json!({"title": "One too many", "url": "https://example.invalid/26"}),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "BOOKMARKS_LIMIT");

    // Deleting one frees a slot.
    let response = get(&app, "/api/bookmarks/get", Some(&cookie)).await;
    let body = body_json(response).await;
    let id = body["data"][0]["id"].as_i64().unwrap();

    let response = send_json(
        &app,
        "DELETE",
        "/api/bookmarks/delete",
        &json!({"id": id}),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        &app,
        "POST",
        "/api/bookmarks/create",
        &json!({"title": "Fits again", "url": "https://example.invalid/again"}),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_bookmark_ownership() {
    let (app, state) = spawn_app().await;
    let owner = register_and_login(&app, &state, "mona@example.com", "mona", "password123").await;
    let other = register_and_login(&app, &state, "nick@example.com", "nick", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/api/bookmarks/create",
        &json!({"title": "Private", "url": "https://example.invalid/private"}),
        Some(&owner),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = send_json(
        &app,
        "DELETE",
        "/api/bookmarks/delete",
        &json!({"id": id}),
        Some(&other),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "BELONGS_TO_ANOTHER_USER");

    let response = send_json(
        &app,
        "POST",
        "/api/bookmarks/update",
        &json!({
            "id": id,
            "title": "Hijacked",
            "url": "https://example.invalid/hijacked",
            "show_text": true
        }),
        Some(&other),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Untouched for the owner.
    let response = get(&app, "/api/bookmarks/get", Some(&owner)).await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Private");

    let response = get(&app, "/api/bookmarks/get", Some(&other)).await;
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_request_verification_for_verified_account() {
    let (app, state) = spawn_app().await;
    register_and_login(&app, &state, "olga@example.com", "olga", "password123").await;

    let response = send_json(
        &app,
        "POST",
        "/user/verify-email/request",
        &json!({"username": "olga"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "USER_ALREADY_VERIFIED");
}
