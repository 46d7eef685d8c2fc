/// In-process [`Storage`]
///
/// Holds every table behind one `RwLock` and assigns serial ids the way
/// PostgreSQL does. Username uniqueness and user foreign keys are checked on
/// every write, reporting the same constraint names as the SQL schema.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use super::{Storage, StorageError, USERNAME_UNIQUE_CONSTRAINT};
use crate::models::{
    Approval, Ban, NewBan, NewSupportTicket, NewTask, NewUser, NewWarning, SupportTicket, Task,
    TicketStatus, UpdateSupportTicket, UpdateUser, User, Warning,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    warnings: Vec<Warning>,
    bans: Vec<Ban>,
    tickets: Vec<SupportTicket>,
    next_user_id: i32,
    next_task_id: i32,
    next_warning_id: i32,
    next_ban_id: i32,
    next_ticket_id: i32,
}

impl Tables {
    /// Rejects a reference to a user id that does not exist
    fn check_user(&self, id: i32, constraint: &str) -> Result<(), StorageError> {
        if self.users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(StorageError::ForeignKeyViolation(constraint.to_string()))
        }
    }
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StorageError::UniqueViolation(
                USERNAME_UNIQUE_CONSTRAINT.to_string(),
            ));
        }

        let user = User {
            id: next_id(&mut tables.next_user_id),
            username: user.username,
            password: user.password_hash,
            role: user.role,
            nickname: user.nickname,
            preferences: user.preferences.map(Json),
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn update_user(&self, id: i32, patch: UpdateUser) -> Result<User, StorageError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StorageError::NotFound { entity: "user", id })?;

        if let Some(password_hash) = patch.password_hash {
            user.password = password_hash;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(nickname) = patch.nickname {
            user.nickname = nickname;
        }
        if let Some(preferences) = patch.preferences {
            user.preferences = preferences.map(Json);
        }

        Ok(user.clone())
    }

    async fn get_task(&self, id: i32) -> Result<Option<Task>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_tasks(&self) -> Result<Vec<Task>, StorageError> {
        Ok(self.tables.read().await.tasks.clone())
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StorageError> {
        let mut tables = self.tables.write().await;
        tables.check_user(task.user_id, "tasks_user_id_fkey")?;
        tables.check_user(task.created_by, "tasks_created_by_fkey")?;

        let task = Task {
            id: next_id(&mut tables.next_task_id),
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            completed: false,
            due_date: task.due_date,
            created_by: task.created_by,
            approved: false,
            approved_by: None,
            approval_note: None,
        };
        tables.tasks.push(task.clone());

        Ok(task)
    }

    async fn set_task_completed(&self, id: i32, completed: bool) -> Result<Task, StorageError> {
        let mut tables = self.tables.write().await;
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::NotFound { entity: "task", id })?;

        task.completed = completed;
        Ok(task.clone())
    }

    async fn approve_task(&self, id: i32, approval: Approval) -> Result<Task, StorageError> {
        let mut tables = self.tables.write().await;
        tables.check_user(approval.moderator_id, "tasks_approved_by_fkey")?;
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::NotFound { entity: "task", id })?;

        task.approved = true;
        task.approved_by = Some(approval.moderator_id);
        task.approval_note = Some(approval.note);
        Ok(task.clone())
    }

    async fn list_warnings(&self, user_id: i32) -> Result<Vec<Warning>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .warnings
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_warnings(&self) -> Result<Vec<Warning>, StorageError> {
        Ok(self.tables.read().await.warnings.clone())
    }

    async fn create_warning(&self, warning: NewWarning) -> Result<Warning, StorageError> {
        let mut tables = self.tables.write().await;
        tables.check_user(warning.user_id, "warnings_user_id_fkey")?;
        tables.check_user(warning.issued_by, "warnings_issued_by_fkey")?;

        let warning = Warning {
            id: next_id(&mut tables.next_warning_id),
            user_id: warning.user_id,
            reason: warning.reason,
            issued_at: Utc::now(),
            issued_by: warning.issued_by,
            approved: false,
            approved_by: None,
            approval_note: None,
        };
        tables.warnings.push(warning.clone());

        Ok(warning)
    }

    async fn approve_warning(&self, id: i32, approval: Approval) -> Result<Warning, StorageError> {
        let mut tables = self.tables.write().await;
        tables.check_user(approval.moderator_id, "warnings_approved_by_fkey")?;
        let warning = tables
            .warnings
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(StorageError::NotFound {
                entity: "warning",
                id,
            })?;

        warning.approved = true;
        warning.approved_by = Some(approval.moderator_id);
        warning.approval_note = Some(approval.note);
        Ok(warning.clone())
    }

    async fn list_bans(&self, user_id: i32) -> Result<Vec<Ban>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bans
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_bans(&self) -> Result<Vec<Ban>, StorageError> {
        Ok(self.tables.read().await.bans.clone())
    }

    async fn create_ban(&self, ban: NewBan) -> Result<Ban, StorageError> {
        let mut tables = self.tables.write().await;
        tables.check_user(ban.user_id, "bans_user_id_fkey")?;
        tables.check_user(ban.issued_by, "bans_issued_by_fkey")?;

        let ban = Ban {
            id: next_id(&mut tables.next_ban_id),
            user_id: ban.user_id,
            reason: ban.reason,
            expires_at: ban.expires_at,
            issued_at: Utc::now(),
            issued_by: ban.issued_by,
            approved: false,
            approved_by: None,
            approval_note: None,
        };
        tables.bans.push(ban.clone());

        Ok(ban)
    }

    async fn approve_ban(&self, id: i32, approval: Approval) -> Result<Ban, StorageError> {
        let mut tables = self.tables.write().await;
        tables.check_user(approval.moderator_id, "bans_approved_by_fkey")?;
        let ban = tables
            .bans
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StorageError::NotFound { entity: "ban", id })?;

        ban.approved = true;
        ban.approved_by = Some(approval.moderator_id);
        ban.approval_note = Some(approval.note);
        Ok(ban.clone())
    }

    async fn create_support_ticket(
        &self,
        ticket: NewSupportTicket,
    ) -> Result<SupportTicket, StorageError> {
        let mut tables = self.tables.write().await;
        tables.check_user(ticket.user_id, "support_tickets_user_id_fkey")?;

        let ticket = SupportTicket {
            id: next_id(&mut tables.next_ticket_id),
            user_id: ticket.user_id,
            subject: ticket.subject,
            description: ticket.description,
            status: TicketStatus::Open,
            created_at: Utc::now(),
            assigned_to: None,
            attachment_url: ticket.attachment_url,
        };
        tables.tickets.push(ticket.clone());

        Ok(ticket)
    }

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>, StorageError> {
        Ok(self.tables.read().await.tickets.clone())
    }

    async fn list_support_tickets_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<SupportTicket>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tickets
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_support_ticket(
        &self,
        id: i32,
        patch: UpdateSupportTicket,
    ) -> Result<SupportTicket, StorageError> {
        let mut tables = self.tables.write().await;
        if let Some(Some(assignee)) = patch.assigned_to {
            tables.check_user(assignee, "support_tickets_assigned_to_fkey")?;
        }

        let ticket = tables
            .tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::NotFound {
                entity: "support ticket",
                id,
            })?;

        if let Some(status) = patch.status {
            ticket.status = status;
        }
        if let Some(assigned_to) = patch.assigned_to {
            ticket.assigned_to = assigned_to;
        }

        Ok(ticket.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
