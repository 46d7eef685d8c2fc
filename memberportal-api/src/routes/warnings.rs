/// Warning routes
///
/// Admins issue warnings; members read their own; moderators approve.

use crate::{app::AppState, error::ApiResult, routes::ApprovalRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use memberportal_shared::{
    auth::{
        authorization::{require_admin, require_moderator},
        middleware::AuthContext,
    },
    models::{Approval, NewWarning, Warning},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarningRequest {
    pub user_id: i32,

    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,
}

/// List the caller's warnings
pub async fn list_warnings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Warning>>> {
    Ok(Json(state.storage.list_warnings(auth.user_id).await?))
}

/// Issue a warning
///
/// # Errors
///
/// - 401 unless the caller is an admin
/// - 422 when the reason is empty
/// - 400 when the target user does not exist
pub async fn create_warning(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateWarningRequest>,
) -> ApiResult<(StatusCode, Json<Warning>)> {
    require_admin(&auth)?;
    req.validate()?;

    let warning = state
        .storage
        .create_warning(NewWarning {
            user_id: req.user_id,
            reason: req.reason,
            issued_by: auth.user_id,
        })
        .await?;

    tracing::info!(
        warning_id = warning.id,
        user_id = warning.user_id,
        issued_by = auth.user_id,
        "Warning issued"
    );

    Ok((StatusCode::CREATED, Json(warning)))
}

pub async fn approve_warning(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<Json<Warning>> {
    require_moderator(&auth)?;
    req.validate()?;

    let warning = state
        .storage
        .approve_warning(id, Approval::new(auth.user_id, req.note))
        .await?;

    tracing::info!(warning_id = id, approved_by = auth.user_id, "Warning approved");

    Ok(Json(warning))
}

/// List every warning
pub async fn list_all_warnings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Warning>>> {
    require_admin(&auth)?;

    Ok(Json(state.storage.list_all_warnings().await?))
}
