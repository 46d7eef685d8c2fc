/// Ban routes
///
/// Every ban leaves the API as a [`BanView`]: the stored row plus `active`
/// and `status`, evaluated against the clock when the response is built.
///
/// # Endpoints
///
/// - `GET /api/bans`: the caller's bans
/// - `POST /api/bans`: issue a ban; omit `expiresAt` for a permanent one (admin)
/// - `POST /api/bans/:id/approve`: moderator sign-off
/// - `GET /api/admin/bans`: every ban (admin)

use crate::{app::AppState, error::ApiResult, routes::ApprovalRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use memberportal_shared::{
    auth::{
        authorization::{require_admin, require_moderator},
        middleware::AuthContext,
    },
    models::{Approval, Ban, BanView, NewBan},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBanRequest {
    pub user_id: i32,

    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,

    pub expires_at: Option<DateTime<Utc>>,
}

fn views(bans: Vec<Ban>) -> Vec<BanView> {
    let now = Utc::now();
    bans.into_iter().map(|ban| BanView::at(ban, now)).collect()
}

/// List the caller's bans
pub async fn list_bans(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BanView>>> {
    let bans = state.storage.list_bans(auth.user_id).await?;
    Ok(Json(views(bans)))
}

/// Issue a ban
///
/// # Errors
///
/// - 401 unless the caller is an admin
/// - 422 when the reason is empty
/// - 400 when the target user does not exist
pub async fn create_ban(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateBanRequest>,
) -> ApiResult<(StatusCode, Json<BanView>)> {
    require_admin(&auth)?;
    req.validate()?;

    let ban = state
        .storage
        .create_ban(NewBan {
            user_id: req.user_id,
            reason: req.reason,
            expires_at: req.expires_at,
            issued_by: auth.user_id,
        })
        .await?;

    tracing::info!(
        ban_id = ban.id,
        user_id = ban.user_id,
        permanent = ban.is_permanent(),
        issued_by = auth.user_id,
        "Ban issued"
    );

    Ok((StatusCode::CREATED, Json(BanView::at(ban, Utc::now()))))
}

pub async fn approve_ban(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<Json<BanView>> {
    require_moderator(&auth)?;
    req.validate()?;

    let ban = state
        .storage
        .approve_ban(id, Approval::new(auth.user_id, req.note))
        .await?;

    tracing::info!(ban_id = id, approved_by = auth.user_id, "Ban approved");

    Ok(Json(BanView::at(ban, Utc::now())))
}

/// List every ban
pub async fn list_all_bans(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BanView>>> {
    require_admin(&auth)?;

    let bans = state.storage.list_all_bans().await?;
    Ok(Json(views(bans)))
}
