/// Support ticket model
///
/// Members open tickets; moderators move them through
/// `open → in_progress → closed` and may assign them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE ticket_status AS ENUM ('open', 'in_progress', 'closed');
///
/// CREATE TABLE support_tickets (
///     id SERIAL PRIMARY KEY,
///     user_id INTEGER NOT NULL REFERENCES users(id),
///     subject TEXT NOT NULL,
///     description TEXT NOT NULL,
///     status ticket_status NOT NULL DEFAULT 'open',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     assigned_to INTEGER REFERENCES users(id),
///     attachment_url TEXT
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }
}

/// Support ticket row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: i32,

    /// Member who opened the ticket
    pub user_id: i32,

    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub assigned_to: Option<i32>,
    pub attachment_url: Option<String>,
}

/// Input for opening a ticket
#[derive(Debug, Clone)]
pub struct NewSupportTicket {
    pub user_id: i32,
    pub subject: String,
    pub description: String,
    pub attachment_url: Option<String>,
}

/// Patch applied to a ticket
///
/// `assigned_to: Some(None)` unassigns the ticket.
#[derive(Debug, Clone, Default)]
pub struct UpdateSupportTicket {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<Option<i32>>,
}

impl UpdateSupportTicket {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_to.is_none()
    }
}
