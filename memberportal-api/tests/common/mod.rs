//! Common test utilities for integration tests
//!
//! Builds the full router over in-process storage and sessions, seeded with
//! one user per role:
//!
//! | user | role |
//! |---|---|
//! | `admin` | admin |
//! | `mod` | moderator |
//! | `ann` | member |
//! | `bob` | member |
//!
//! All seeded accounts share [`PASSWORD`].

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use memberportal_api::app::{build_router, AppState};
use memberportal_api::config::Config;
use memberportal_shared::auth::password::hash_password;
use memberportal_shared::auth::session::{MemorySessionStore, SessionManager};
use memberportal_shared::models::{NewUser, Role, User};
use memberportal_shared::storage::{MemoryStorage, SharedStorage};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tower::Service as _;

pub const PASSWORD: &str = "correct-horse";

/// Hash of [`PASSWORD`], derived once per test binary
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("hash test password"))
        .clone()
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub storage: SharedStorage,
    pub sessions: SessionManager,
    pub session_store: Arc<MemorySessionStore>,
    pub app: axum::Router,
    pub config: Config,
    pub admin: User,
    pub moderator: User,
    pub ann: User,
    pub bob: User,
}

/// Response with the body already collected
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `name=value` part of the Set-Cookie header
    pub fn cookie(&self) -> Option<String> {
        self.set_cookie()
            .and_then(|c| c.split(';').next().map(|pair| pair.trim().to_string()))
    }

    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

impl TestContext {
    pub async fn new() -> Self {
        let mut config = Config::default();
        config.api.allow_registration = true;
        Self::with_config(config).await
    }

    pub async fn with_config(config: Config) -> Self {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let session_store = Arc::new(MemorySessionStore::new());
        let sessions = SessionManager::new(session_store.clone(), config.session.ttl_seconds);

        let admin = seed_user(&storage, "admin", Role::Admin).await;
        let moderator = seed_user(&storage, "mod", Role::Moderator).await;
        let ann = seed_user(&storage, "ann", Role::Member).await;
        let bob = seed_user(&storage, "bob", Role::Member).await;

        let state = AppState::new(storage.clone(), sessions.clone(), config.clone());
        let app = build_router(state);

        Self {
            storage,
            sessions,
            session_store,
            app,
            config,
            admin,
            moderator,
            ann,
            bob,
        }
    }

    /// Sends a request, optionally with a session cookie and a JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(cookie), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(cookie), Some(body)).await
    }

    /// Logs in through the API and returns the session cookie pair
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.text());
        response.cookie().expect("login sets a cookie")
    }

    /// Issues a session directly, skipping password verification
    pub async fn cookie_for(&self, user: &User) -> String {
        let issued = self.sessions.issue(user.id).await.unwrap();
        format!("{}={}", self.config.session.cookie_name, issued.token)
    }
}

pub async fn seed_user(storage: &SharedStorage, username: &str, role: Role) -> User {
    storage
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: password_hash(),
            role,
            nickname: None,
            preferences: None,
        })
        .await
        .unwrap()
}
