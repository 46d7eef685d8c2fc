/// PostgreSQL-backed [`Storage`]
///
/// Column lists are spelled out per entity so every `RETURNING` hands back
/// the full row, server defaults included.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{Storage, StorageError};
use crate::models::{
    Approval, Ban, NewBan, NewSupportTicket, NewTask, NewUser, NewWarning, SupportTicket, Task,
    UpdateSupportTicket, UpdateUser, User, Warning,
};

const USER_COLUMNS: &str = "id, username, password, role, nickname, preferences";

const TASK_COLUMNS: &str =
    "id, user_id, title, description, completed, due_date, created_by, approved, approved_by, approval_note";

const WARNING_COLUMNS: &str =
    "id, user_id, reason, issued_at, issued_by, approved, approved_by, approval_note";

const BAN_COLUMNS: &str =
    "id, user_id, reason, expires_at, issued_at, issued_by, approved, approved_by, approval_note";

const TICKET_COLUMNS: &str =
    "id, user_id, subject, description, status, created_at, assigned_to, attachment_url";

/// sqlx implementation of the data access layer
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Sets the three approval columns on `table` and returns the row
    async fn approve<T>(
        &self,
        table: &str,
        columns: &str,
        entity: &'static str,
        id: i32,
        approval: Approval,
    ) -> Result<T, StorageError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let query = format!(
            "UPDATE {} SET approved = TRUE, approved_by = $2, approval_note = $3 WHERE id = $1 RETURNING {}",
            table, columns
        );

        sqlx::query_as::<_, T>(&query)
            .bind(id)
            .bind(approval.moderator_id)
            .bind(approval.note)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound { entity, id })
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let query = format!(
            "INSERT INTO users (username, password, role, nickname, preferences) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.role)
            .bind(user.nickname)
            .bind(user.preferences.map(Json))
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let query = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update_user(&self, id: i32, patch: UpdateUser) -> Result<User, StorageError> {
        if patch.is_empty() {
            return self
                .get_user(id)
                .await?
                .ok_or(StorageError::NotFound { entity: "user", id });
        }

        // Build dynamic update query based on which fields are present
        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if patch.password_hash.is_some() {
            bind_count += 1;
            assignments.push(format!("password = ${}", bind_count));
        }
        if patch.role.is_some() {
            bind_count += 1;
            assignments.push(format!("role = ${}", bind_count));
        }
        if patch.nickname.is_some() {
            bind_count += 1;
            assignments.push(format!("nickname = ${}", bind_count));
        }
        if patch.preferences.is_some() {
            bind_count += 1;
            assignments.push(format!("preferences = ${}", bind_count));
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING {}",
            assignments.join(", "),
            USER_COLUMNS
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(password_hash) = patch.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(role) = patch.role {
            q = q.bind(role);
        }
        if let Some(nickname) = patch.nickname {
            q = q.bind(nickname);
        }
        if let Some(preferences) = patch.preferences {
            q = q.bind(preferences.map(Json));
        }

        q.fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound { entity: "user", id })
    }

    async fn get_task(&self, id: i32) -> Result<Option<Task>, StorageError> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, StorageError> {
        let query = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY id",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn list_all_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let query = format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS);
        let tasks = sqlx::query_as::<_, Task>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StorageError> {
        let query = format!(
            "INSERT INTO tasks (user_id, title, description, due_date, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task.user_id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.due_date)
            .bind(task.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn set_task_completed(&self, id: i32, completed: bool) -> Result<Task, StorageError> {
        let query = format!(
            "UPDATE tasks SET completed = $2 WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(completed)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound { entity: "task", id })
    }

    async fn approve_task(&self, id: i32, approval: Approval) -> Result<Task, StorageError> {
        self.approve("tasks", TASK_COLUMNS, "task", id, approval).await
    }

    async fn list_warnings(&self, user_id: i32) -> Result<Vec<Warning>, StorageError> {
        let query = format!(
            "SELECT {} FROM warnings WHERE user_id = $1 ORDER BY id",
            WARNING_COLUMNS
        );
        let warnings = sqlx::query_as::<_, Warning>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(warnings)
    }

    async fn list_all_warnings(&self) -> Result<Vec<Warning>, StorageError> {
        let query = format!("SELECT {} FROM warnings ORDER BY id", WARNING_COLUMNS);
        let warnings = sqlx::query_as::<_, Warning>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(warnings)
    }

    async fn create_warning(&self, warning: NewWarning) -> Result<Warning, StorageError> {
        let query = format!(
            "INSERT INTO warnings (user_id, reason, issued_by) VALUES ($1, $2, $3) RETURNING {}",
            WARNING_COLUMNS
        );
        let warning = sqlx::query_as::<_, Warning>(&query)
            .bind(warning.user_id)
            .bind(warning.reason)
            .bind(warning.issued_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(warning)
    }

    async fn approve_warning(&self, id: i32, approval: Approval) -> Result<Warning, StorageError> {
        self.approve("warnings", WARNING_COLUMNS, "warning", id, approval)
            .await
    }

    async fn list_bans(&self, user_id: i32) -> Result<Vec<Ban>, StorageError> {
        let query = format!(
            "SELECT {} FROM bans WHERE user_id = $1 ORDER BY id",
            BAN_COLUMNS
        );
        let bans = sqlx::query_as::<_, Ban>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(bans)
    }

    async fn list_all_bans(&self) -> Result<Vec<Ban>, StorageError> {
        let query = format!("SELECT {} FROM bans ORDER BY id", BAN_COLUMNS);
        let bans = sqlx::query_as::<_, Ban>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(bans)
    }

    async fn create_ban(&self, ban: NewBan) -> Result<Ban, StorageError> {
        let query = format!(
            "INSERT INTO bans (user_id, reason, expires_at, issued_by) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            BAN_COLUMNS
        );
        let ban = sqlx::query_as::<_, Ban>(&query)
            .bind(ban.user_id)
            .bind(ban.reason)
            .bind(ban.expires_at)
            .bind(ban.issued_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(ban)
    }

    async fn approve_ban(&self, id: i32, approval: Approval) -> Result<Ban, StorageError> {
        self.approve("bans", BAN_COLUMNS, "ban", id, approval).await
    }

    async fn create_support_ticket(
        &self,
        ticket: NewSupportTicket,
    ) -> Result<SupportTicket, StorageError> {
        let query = format!(
            "INSERT INTO support_tickets (user_id, subject, description, attachment_url) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TICKET_COLUMNS
        );
        let ticket = sqlx::query_as::<_, SupportTicket>(&query)
            .bind(ticket.user_id)
            .bind(ticket.subject)
            .bind(ticket.description)
            .bind(ticket.attachment_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>, StorageError> {
        let query = format!("SELECT {} FROM support_tickets ORDER BY id", TICKET_COLUMNS);
        let tickets = sqlx::query_as::<_, SupportTicket>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn list_support_tickets_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<SupportTicket>, StorageError> {
        let query = format!(
            "SELECT {} FROM support_tickets WHERE user_id = $1 ORDER BY id",
            TICKET_COLUMNS
        );
        let tickets = sqlx::query_as::<_, SupportTicket>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn update_support_ticket(
        &self,
        id: i32,
        patch: UpdateSupportTicket,
    ) -> Result<SupportTicket, StorageError> {
        if patch.is_empty() {
            let query = format!("SELECT {} FROM support_tickets WHERE id = $1", TICKET_COLUMNS);
            return sqlx::query_as::<_, SupportTicket>(&query)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StorageError::NotFound {
                    entity: "support ticket",
                    id,
                });
        }

        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if patch.status.is_some() {
            bind_count += 1;
            assignments.push(format!("status = ${}", bind_count));
        }
        if patch.assigned_to.is_some() {
            bind_count += 1;
            assignments.push(format!("assigned_to = ${}", bind_count));
        }

        let query = format!(
            "UPDATE support_tickets SET {} WHERE id = $1 RETURNING {}",
            assignments.join(", "),
            TICKET_COLUMNS
        );

        let mut q = sqlx::query_as::<_, SupportTicket>(&query).bind(id);

        if let Some(status) = patch.status {
            q = q.bind(status);
        }
        if let Some(assigned_to) = patch.assigned_to {
            q = q.bind(assigned_to);
        }

        q.fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound {
                entity: "support ticket",
                id,
            })
    }

    async fn health_check(&self) -> bool {
        crate::db::pool::health_check(&self.pool).await.is_ok()
    }
}
