/// Moderator sign-off shared by tasks, warnings and bans
///
/// Each of those tables carries `approved`, `approved_by` and `approval_note`
/// columns. Approving a record sets all three in one statement.

use serde::{Deserialize, Serialize};

/// Approval decision recorded against a task, warning or ban
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    /// Moderator (or admin) signing off
    pub moderator_id: i32,

    /// Free-text note stored with the approval
    pub note: String,
}

impl Approval {
    pub fn new(moderator_id: i32, note: impl Into<String>) -> Self {
        Self {
            moderator_id,
            note: note.into(),
        }
    }
}
