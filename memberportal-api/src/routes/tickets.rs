/// Support ticket routes
///
/// # Endpoints
///
/// - `POST /api/tickets`: open a ticket
/// - `GET /api/tickets`: the caller's tickets
/// - `GET /api/admin/tickets`: every ticket (moderator+)
/// - `PATCH /api/admin/tickets/:id`: change status or assignee (moderator+)

use crate::{app::AppState, error::ApiResult, routes::double_option};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use memberportal_shared::{
    auth::{authorization::require_moderator, middleware::AuthContext},
    models::{NewSupportTicket, SupportTicket, TicketStatus, UpdateSupportTicket},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(url(message = "Attachment must be a URL"))]
    pub attachment_url: Option<String>,
}

/// Triage patch; `assignedTo: null` unassigns
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<i32>>,
}

impl From<UpdateTicketRequest> for UpdateSupportTicket {
    fn from(req: UpdateTicketRequest) -> Self {
        Self {
            status: req.status,
            assigned_to: req.assigned_to,
        }
    }
}

/// Open a ticket
pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<SupportTicket>)> {
    req.validate()?;

    let ticket = state
        .storage
        .create_support_ticket(NewSupportTicket {
            user_id: auth.user_id,
            subject: req.subject,
            description: req.description,
            attachment_url: req.attachment_url,
        })
        .await?;

    tracing::info!(ticket_id = ticket.id, user_id = auth.user_id, "Ticket opened");

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List the caller's tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<SupportTicket>>> {
    Ok(Json(
        state.storage.list_support_tickets_for_user(auth.user_id).await?,
    ))
}

pub async fn list_all_tickets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<SupportTicket>>> {
    require_moderator(&auth)?;

    Ok(Json(state.storage.list_support_tickets().await?))
}

/// Update a ticket's status or assignee
///
/// # Errors
///
/// - 401 unless the caller is a moderator or admin
/// - 404 when the ticket does not exist
/// - 400 when the assignee does not exist
pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateTicketRequest>,
) -> ApiResult<Json<SupportTicket>> {
    require_moderator(&auth)?;

    let ticket = state
        .storage
        .update_support_ticket(id, req.into())
        .await?;

    tracing::info!(
        ticket_id = id,
        status = ticket.status.as_str(),
        updated_by = auth.user_id,
        "Ticket updated"
    );

    Ok(Json(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null() {
        let unassign: UpdateTicketRequest =
            serde_json::from_str(r#"{"assignedTo": null}"#).unwrap();
        assert_eq!(UpdateSupportTicket::from(unassign).assigned_to, Some(None));

        let status_only: UpdateTicketRequest =
            serde_json::from_str(r#"{"status": "in_progress"}"#).unwrap();
        let patch = UpdateSupportTicket::from(status_only);
        assert_eq!(patch.status, Some(TicketStatus::InProgress));
        assert_eq!(patch.assigned_to, None);
    }

    #[test]
    fn test_attachment_must_be_url() {
        let req = CreateTicketRequest {
            subject: "Login".to_string(),
            description: "Cannot log in".to_string(),
            attachment_url: Some("not a url".to_string()),
        };
        assert!(req.validate().is_err());

        let req = CreateTicketRequest {
            attachment_url: Some("https://files.example/screenshot.png".to_string()),
            ..req
        };
        assert!(req.validate().is_ok());
    }
}
