/// Task routes
///
/// # Endpoints
///
/// - `GET /api/tasks`: the caller's tasks
/// - `POST /api/tasks`: create a task (admins may target another user)
/// - `PATCH /api/tasks/:id`: set `completed` (owner or admin)
/// - `POST /api/tasks/:id/approve`: moderator sign-off
/// - `GET /api/admin/tasks`: every task (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::ApprovalRequest,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use memberportal_shared::{
    auth::{
        authorization::{require_admin, require_moderator, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::{Approval, NewTask, Task},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,

    /// Assignee; honoured for admins only
    pub user_id: Option<i32>,
}

impl CreateTaskRequest {
    /// Owner of the new task: the caller, unless an admin names someone else
    pub fn owner_for(&self, auth: &AuthContext) -> i32 {
        match self.user_id {
            Some(user_id) if auth.is_admin() => user_id,
            _ => auth.user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub completed: bool,
}

/// List the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.storage.list_tasks(auth.user_id).await?;
    Ok(Json(tasks))
}

/// Create a task
///
/// # Errors
///
/// - 422 when the title is empty
/// - 400 when an admin targets a user that does not exist
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let user_id = req.owner_for(&auth);
    let task = state
        .storage
        .create_task(NewTask {
            user_id,
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            created_by: auth.user_id,
        })
        .await?;

    tracing::info!(task_id = task.id, user_id, created_by = auth.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Mark a task completed or open again
///
/// # Errors
///
/// - 404 when the task does not exist
/// - 401 when the caller neither owns the task nor is an admin
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .storage
        .get_task(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task {} not found", id)))?;

    require_owner_or_admin(&auth, task.user_id)?;

    let task = state.storage.set_task_completed(id, req.completed).await?;

    tracing::debug!(task_id = id, completed = req.completed, "Task updated");

    Ok(Json(task))
}

/// Approve a task
pub async fn approve_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<Json<Task>> {
    require_moderator(&auth)?;
    req.validate()?;

    let task = state
        .storage
        .approve_task(id, Approval::new(auth.user_id, req.note))
        .await?;

    tracing::info!(task_id = id, approved_by = auth.user_id, "Task approved");

    Ok(Json(task))
}

/// List every task
pub async fn list_all_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    require_admin(&auth)?;

    Ok(Json(state.storage.list_all_tasks().await?))
}
