/// Data access layer
///
/// [`Storage`] is the typed CRUD contract over the five portal entities.
/// Every method maps to a single statement. Collections come back ordered by
/// id; writes return the persisted row including server defaults.
///
/// The storage object is built once at startup and handed to the router as
/// [`SharedStorage`].
///
/// # Implementations
///
/// - [`PgStorage`]: PostgreSQL via sqlx
/// - [`MemoryStorage`]: in-process tables with the same unique and
///   foreign-key rules, for tests and local runs
///
/// # Example
///
/// ```
/// use memberportal_shared::models::{NewUser, Role};
/// use memberportal_shared::storage::{MemoryStorage, Storage, StorageError};
///
/// # async fn example() -> Result<(), StorageError> {
/// let storage = MemoryStorage::new();
/// let alice = storage
///     .create_user(NewUser {
///         username: "alice".to_string(),
///         password_hash: "00.00".to_string(),
///         role: Role::Member,
///         nickname: None,
///         preferences: None,
///     })
///     .await?;
///
/// assert_eq!(storage.get_user_by_username("alice").await?.map(|u| u.id), Some(alice.id));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{
    Approval, Ban, NewBan, NewSupportTicket, NewTask, NewUser, NewWarning, SupportTicket, Task,
    UpdateSupportTicket, UpdateUser, User, Warning,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Name of the unique constraint on `users.username`
pub const USERNAME_UNIQUE_CONSTRAINT: &str = "users_username_key";

/// PostgreSQL SQLSTATE for unique violations
const PG_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign-key violations
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Update or approval targeted a row that does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Referenced row does not exist
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StorageError {
    /// True when the write collided with an existing username
    pub fn is_duplicate_username(&self) -> bool {
        matches!(self, StorageError::UniqueViolation(c) if c == USERNAME_UNIQUE_CONSTRAINT)
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => return StorageError::UniqueViolation(constraint),
                Some(PG_FOREIGN_KEY_VIOLATION) => {
                    return StorageError::ForeignKeyViolation(constraint)
                }
                _ => {}
            }
        }
        StorageError::Database(err)
    }
}

/// Shared handle injected into request handlers
pub type SharedStorage = Arc<dyn Storage>;

/// Typed CRUD over users, tasks, warnings, bans and support tickets
#[async_trait]
pub trait Storage: Send + Sync {
    // Users

    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// `UniqueViolation(USERNAME_UNIQUE_CONSTRAINT)` if the username is taken
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// An empty patch returns the current row unchanged
    async fn update_user(&self, id: i32, patch: UpdateUser) -> Result<User, StorageError>;

    // Tasks

    async fn get_task(&self, id: i32) -> Result<Option<Task>, StorageError>;

    /// Tasks owned by `user_id`
    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, StorageError>;

    async fn list_all_tasks(&self) -> Result<Vec<Task>, StorageError>;

    async fn create_task(&self, task: NewTask) -> Result<Task, StorageError>;

    async fn set_task_completed(&self, id: i32, completed: bool) -> Result<Task, StorageError>;

    async fn approve_task(&self, id: i32, approval: Approval) -> Result<Task, StorageError>;

    // Warnings

    async fn list_warnings(&self, user_id: i32) -> Result<Vec<Warning>, StorageError>;

    async fn list_all_warnings(&self) -> Result<Vec<Warning>, StorageError>;

    async fn create_warning(&self, warning: NewWarning) -> Result<Warning, StorageError>;

    async fn approve_warning(&self, id: i32, approval: Approval) -> Result<Warning, StorageError>;

    // Bans

    async fn list_bans(&self, user_id: i32) -> Result<Vec<Ban>, StorageError>;

    async fn list_all_bans(&self) -> Result<Vec<Ban>, StorageError>;

    async fn create_ban(&self, ban: NewBan) -> Result<Ban, StorageError>;

    async fn approve_ban(&self, id: i32, approval: Approval) -> Result<Ban, StorageError>;

    // Support tickets

    async fn create_support_ticket(
        &self,
        ticket: NewSupportTicket,
    ) -> Result<SupportTicket, StorageError>;

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>, StorageError>;

    async fn list_support_tickets_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<SupportTicket>, StorageError>;

    /// An empty patch returns the current row unchanged
    async fn update_support_ticket(
        &self,
        id: i32,
        patch: UpdateSupportTicket,
    ) -> Result<SupportTicket, StorageError>;

    /// Reports whether the backing store is reachable
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_username_detection() {
        assert!(StorageError::UniqueViolation(USERNAME_UNIQUE_CONSTRAINT.to_string())
            .is_duplicate_username());
        assert!(!StorageError::UniqueViolation("other_key".to_string()).is_duplicate_username());
        assert!(!StorageError::NotFound { entity: "user", id: 1 }.is_duplicate_username());
    }

    #[test]
    fn test_not_found_message() {
        let err = StorageError::NotFound { entity: "task", id: 9 };
        assert_eq!(err.to_string(), "task 9 not found");
    }

    #[test]
    fn test_non_database_sqlx_error_is_database() {
        let err = StorageError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StorageError::Database(_)));
    }
}
