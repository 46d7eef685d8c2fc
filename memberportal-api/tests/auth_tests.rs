/// Session authentication over HTTP
///
/// Login, logout, registration, expiry and the unauthenticated surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{TestContext, PASSWORD};
use memberportal_api::config::Config;
use serde_json::json;

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "ann", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);

    let set_cookie = response.set_cookie().unwrap();
    assert!(set_cookie.starts_with("portal_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=604800"));
    assert!(!set_cookie.contains("Secure"));

    let body = response.json();
    assert_eq!(body["username"], "ann");
    assert_eq!(body["role"], "member");
    assert_eq!(body["isAdmin"], false);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_login_cookie_authenticates_requests() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login("ann", PASSWORD).await;

    let response = ctx.get("/api/user", &cookie).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], ctx.ann.id);
}

#[tokio::test]
async fn test_wrong_password_is_empty_401() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "ann", "password": "nope" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.is_empty());
    assert!(response.set_cookie().is_none());
}

#[tokio::test]
async fn test_unknown_user_is_empty_401() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "mallory", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_login_empty_fields_is_422() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "", "password": "" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_logout_revokes_session_immediately() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login("ann", PASSWORD).await;

    let response = ctx.send(Method::POST, "/api/logout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.set_cookie().unwrap().contains("Max-Age=0"));

    // The old cookie is dead even if the browser keeps sending it
    let response = ctx.get("/api/user", &cookie).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(ctx.session_store.is_empty().await);
}

#[tokio::test]
async fn test_logout_only_ends_one_session() {
    let ctx = TestContext::new().await;
    let laptop = ctx.cookie_for(&ctx.ann).await;
    let phone = ctx.cookie_for(&ctx.ann).await;

    ctx.send(Method::POST, "/api/logout", Some(&laptop), None).await;

    assert_eq!(ctx.get("/api/user", &laptop).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.get("/api/user", &phone).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_is_unauthenticated() {
    let mut config = Config::default();
    config.session.ttl_seconds = 0;
    let ctx = TestContext::with_config(config).await;

    let cookie = ctx.cookie_for(&ctx.ann).await;

    let response = ctx.get("/api/user", &cookie).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_cookie_is_unauthenticated() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/api/user", "portal_session=deadbeef").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let ctx = TestContext::new().await;

    for (method, uri) in [
        (Method::GET, "/api/user"),
        (Method::POST, "/api/logout"),
        (Method::GET, "/api/users"),
        (Method::GET, "/api/tasks"),
        (Method::GET, "/api/warnings"),
        (Method::GET, "/api/bans"),
        (Method::GET, "/api/tickets"),
        (Method::GET, "/api/admin/tasks"),
        (Method::GET, "/api/admin/tickets"),
    ] {
        let response = ctx.send(method.clone(), uri, None, None).await;
        assert_eq!(
            response.status,
            StatusCode::UNAUTHORIZED,
            "{} {} should require a session",
            method,
            uri
        );
        assert!(response.body.is_empty());
    }
}

#[tokio::test]
async fn test_register_creates_member_and_logs_in() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "username": "carol", "password": "pw", "nickname": "Caz" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["role"], "member");
    assert_eq!(body["nickname"], "Caz");

    let cookie = response.cookie().unwrap();
    assert_eq!(ctx.get("/api/user", &cookie).await.json()["username"], "carol");
}

#[tokio::test]
async fn test_register_duplicate_username_is_400() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "username": "ann", "password": "pw" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Username already exists");
}

#[tokio::test]
async fn test_register_not_mounted_by_default() {
    let ctx = TestContext::with_config(Config::default()).await;

    let response = ctx
        .send(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "username": "carol", "password": "pw" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_own_profile() {
    let ctx = TestContext::new().await;
    let cookie = ctx.cookie_for(&ctx.ann).await;

    let response = ctx
        .patch(
            "/api/user",
            &cookie,
            json!({ "nickname": "Al", "preferences": { "theme": "dark", "buttonColor": "#ff0000" } }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["nickname"], "Al");
    assert_eq!(body["preferences"]["theme"], "dark");
    assert_eq!(body["preferences"]["buttonColor"], "#ff0000");
    assert_eq!(body["role"], "member");

    // null clears
    let body = ctx
        .patch("/api/user", &cookie, json!({ "nickname": null }))
        .await
        .json();
    assert!(body["nickname"].is_null());
    assert_eq!(body["preferences"]["theme"], "dark");
}

#[tokio::test]
async fn test_profile_patch_cannot_change_role() {
    let ctx = TestContext::new().await;
    let cookie = ctx.cookie_for(&ctx.ann).await;

    let response = ctx
        .patch("/api/user", &cookie, json!({ "role": "admin" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["role"], "member");
}
