/// Admin account management
///
/// # Endpoints
///
/// - `POST /api/users`: create an account
/// - `GET /api/users`: list all accounts
/// - `PATCH /api/users/:id`: change password, role, nickname or preferences
///
/// All three require the admin role.

use crate::{
    app::AppState,
    error::ApiResult,
    routes::double_option,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use memberportal_shared::{
    auth::{authorization::require_admin, middleware::AuthContext, password},
    models::{NewUser, Preferences, PublicUser, Role, UpdateUser},
};
use serde::Deserialize;
use validator::Validate;

/// Create-user body
///
/// An explicit `role` wins; otherwise the legacy `isAdmin` / `isMod` flags
/// decide, defaulting to member.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default)]
    pub is_mod: bool,

    pub role: Option<Role>,
    pub nickname: Option<String>,
    pub preferences: Option<Preferences>,
}

impl CreateUserRequest {
    pub fn resolved_role(&self) -> Role {
        self.role
            .unwrap_or_else(|| Role::from_legacy_flags(self.is_admin, self.is_mod))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,

    pub role: Option<Role>,

    #[serde(default, deserialize_with = "double_option")]
    pub nickname: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub preferences: Option<Option<Preferences>>,
}

/// Create a user
///
/// # Errors
///
/// - 401 unless the caller is an admin
/// - 422 when username or password is empty
/// - 400 `Username already exists`
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    require_admin(&auth)?;
    req.validate()?;

    let role = req.resolved_role();
    let password_hash = password::hash_password_async(req.password).await?;

    let user = state
        .storage
        .create_user(NewUser {
            username: req.username,
            password_hash,
            role,
            nickname: req.nickname,
            preferences: req.preferences,
        })
        .await?;

    tracing::info!(
        user_id = user.id,
        username = %user.username,
        role = %user.role,
        created_by = auth.user_id,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

/// List users, ordered by id
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    require_admin(&auth)?;

    let users = state.storage.list_users().await?;

    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/// Update a user
///
/// # Errors
///
/// - 401 unless the caller is an admin
/// - 404 when the user does not exist
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<PublicUser>> {
    require_admin(&auth)?;
    req.validate()?;

    let password_hash = match req.password {
        Some(password) => Some(password::hash_password_async(password).await?),
        None => None,
    };

    let user = state
        .storage
        .update_user(
            id,
            UpdateUser {
                password_hash,
                role: req.role,
                nickname: req.nickname,
                preferences: req.preferences,
            },
        )
        .await?;

    tracing::info!(user_id = user.id, updated_by = auth.user_id, "User updated");

    Ok(Json(PublicUser::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> CreateUserRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_resolved_role_from_legacy_flags() {
        assert_eq!(
            request(r#"{"username":"a","password":"p","isAdmin":true}"#).resolved_role(),
            Role::Admin
        );
        assert_eq!(
            request(r#"{"username":"a","password":"p","isMod":true}"#).resolved_role(),
            Role::Moderator
        );
        assert_eq!(
            request(r#"{"username":"a","password":"p"}"#).resolved_role(),
            Role::Member
        );
    }

    #[test]
    fn test_explicit_role_wins() {
        assert_eq!(
            request(r#"{"username":"a","password":"p","isAdmin":true,"role":"member"}"#)
                .resolved_role(),
            Role::Member
        );
    }

    #[test]
    fn test_empty_password_in_update_rejected() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"password":""}"#).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateUserRequest = serde_json::from_str(r#"{"role":"moderator"}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
