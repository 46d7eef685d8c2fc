/// Warning model
///
/// Disciplinary note issued by an admin. Immutable after creation apart from
/// moderator approval.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE warnings (
///     id SERIAL PRIMARY KEY,
///     user_id INTEGER NOT NULL REFERENCES users(id),
///     reason TEXT NOT NULL,
///     issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     issued_by INTEGER NOT NULL REFERENCES users(id),
///     approved BOOLEAN NOT NULL DEFAULT FALSE,
///     approved_by INTEGER REFERENCES users(id),
///     approval_note TEXT
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Warning row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub id: i32,
    pub user_id: i32,
    pub reason: String,
    pub issued_at: DateTime<Utc>,
    pub issued_by: i32,
    pub approved: bool,
    pub approved_by: Option<i32>,
    pub approval_note: Option<String>,
}

/// Input for issuing a warning
#[derive(Debug, Clone)]
pub struct NewWarning {
    pub user_id: i32,
    pub reason: String,
    pub issued_by: i32,
}
