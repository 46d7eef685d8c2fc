/// Session routes: login, logout, registration and the caller's own profile
///
/// # Endpoints
///
/// - `POST /api/login`: verify credentials, issue a session cookie
/// - `POST /api/logout`: revoke the session, clear the cookie
/// - `POST /api/register`: self-service member signup (when enabled)
/// - `GET /api/user`: the caller's account
/// - `PATCH /api/user`: the caller's nickname and theme preferences
///
/// Failed logins are an empty 401 whether the username or the password was
/// wrong.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::double_option,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use memberportal_shared::{
    auth::{middleware::AuthContext, password},
    models::{NewUser, Preferences, PublicUser, Role, UpdateUser, User},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub nickname: Option<String>,
}

/// Self-service profile patch; `null` clears a field
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub nickname: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub preferences: Option<Option<Preferences>>,
}

/// Issues a session for `user` and renders the response with its cookie
async fn start_session(state: &AppState, status: StatusCode, user: &User) -> ApiResult<Response> {
    let issued = state.sessions().issue(user.id).await?;

    let cookie = state
        .cookies()
        .session_cookie(&issued.token, state.sessions().ttl_seconds())
        .ok_or_else(|| ApiError::InternalError("Session cookie is not a valid header".to_string()))?;

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(PublicUser::from(user)),
    )
        .into_response())
}

/// Log in
///
/// # Errors
///
/// - 422 when username or password is empty
/// - 401 when the username is unknown or the password does not match
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let user = state
        .storage
        .get_user_by_username(&req.username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let valid = password::verify_password_async(req.password, user.password.clone()).await?;
    if !valid {
        tracing::debug!(username = %req.username, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized);
    }

    tracing::info!(user_id = user.id, "User logged in");

    start_session(&state, StatusCode::OK, &user).await
}

/// Log out
///
/// The session record is deleted before responding, so the old cookie is
/// useless even if the browser keeps it.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    if let Some(token) = state.cookies().extract_token(&headers) {
        state.sessions().revoke(&token).await?;
    }

    tracing::info!(user_id = auth.user_id, "User logged out");

    Ok(match state.cookies().clear_cookie() {
        Some(cookie) => (StatusCode::OK, [(header::SET_COOKIE, cookie)]).into_response(),
        None => StatusCode::OK.into_response(),
    })
}

/// Register a member account and log it in
///
/// # Errors
///
/// - 400 `Username already exists`
/// - 422 when username or password is empty
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let password_hash = password::hash_password_async(req.password).await?;

    let user = state
        .storage
        .create_user(NewUser {
            username: req.username,
            password_hash,
            role: Role::Member,
            nickname: req.nickname.filter(|n| !n.is_empty()),
            preferences: None,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Member registered");

    start_session(&state, StatusCode::CREATED, &user).await
}

/// Current user
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PublicUser>> {
    let user = state
        .storage
        .get_user(auth.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(PublicUser::from(user)))
}

/// Update own nickname and preferences
///
/// Role and password are not editable here; admins use `PATCH /api/users/:id`.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<PublicUser>> {
    let user = state
        .storage
        .update_user(
            auth.user_id,
            UpdateUser {
                nickname: req.nickname,
                preferences: req.preferences,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(PublicUser::from(user)))
}
