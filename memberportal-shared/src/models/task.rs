/// Task model
///
/// A task is a unit of work assigned to a member. The owning member flips
/// `completed`; moderators may approve it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id SERIAL PRIMARY KEY,
///     user_id INTEGER NOT NULL REFERENCES users(id),
///     title TEXT NOT NULL,
///     description TEXT,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     due_date TIMESTAMPTZ,
///     created_by INTEGER NOT NULL REFERENCES users(id),
///     approved BOOLEAN NOT NULL DEFAULT FALSE,
///     approved_by INTEGER REFERENCES users(id),
///     approval_note TEXT
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,

    /// Owner of the task
    pub user_id: i32,

    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,

    /// Issuer of the task
    pub created_by: i32,

    pub approved: bool,
    pub approved_by: Option<i32>,
    pub approval_note: Option<String>,
}

impl Task {
    /// True when the due date has passed and the task is still open
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due <= now)
    }
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(completed: bool, due_date: Option<DateTime<Utc>>) -> Task {
        Task {
            id: 1,
            user_id: 2,
            title: "Write report".to_string(),
            description: None,
            completed,
            due_date,
            created_by: 1,
            approved: false,
            approved_by: None,
            approval_note: None,
        }
    }

    #[test]
    fn test_overdue() {
        let now = Utc::now();
        assert!(task(false, Some(now - Duration::hours(1))).is_overdue_at(now));
        assert!(!task(true, Some(now - Duration::hours(1))).is_overdue_at(now));
        assert!(!task(false, Some(now + Duration::hours(1))).is_overdue_at(now));
        assert!(!task(false, None).is_overdue_at(now));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(task(false, None)).unwrap();
        assert_eq!(json["userId"], 2);
        assert_eq!(json["createdBy"], 1);
        assert!(json["dueDate"].is_null());
        assert_eq!(json["completed"], false);
    }
}
