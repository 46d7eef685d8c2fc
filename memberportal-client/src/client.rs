/// Typed HTTP client for the portal API
///
/// One [`PortalClient`] is one browser-like session: the underlying
/// `reqwest` client keeps a cookie jar, so after [`PortalClient::login`]
/// every call carries the session cookie.
///
/// # Example
///
/// ```no_run
/// use memberportal_client::{NewTask, PortalClient};
///
/// # async fn example() -> Result<(), memberportal_client::ClientError> {
/// let client = PortalClient::new("http://localhost:8080")?;
/// client.login("admin", "change-me").await?;
///
/// let task = client
///     .create_task(&NewTask::titled("Review applications"))
///     .await?;
/// client.set_task_completed(task.id, true).await?;
/// # Ok(())
/// # }
/// ```

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use memberportal_shared::models::{
    BanView, Preferences, PublicUser, Role, SupportTicket, Task, TicketStatus, Warning,
};
use reqwest::{Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Body of `POST /api/users`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub username: String,
    pub password: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

/// Body of `PATCH /api/users/:id`; `Some(None)` clears a field
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Option<Preferences>>,
}

/// Body of `PATCH /api/user`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Option<Preferences>>,
}

/// Body of `POST /api/tasks`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Only honoured when the caller is an admin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Body of `POST /api/tickets`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub subject: String,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Body of `PATCH /api/admin/tickets/:id`; `assigned_to: Some(None)` unassigns
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<i32>>,
}

/// `GET /health` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub database: String,
    pub sessions: String,
}

/// Portal API client
#[derive(Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PortalClient {
    /// Creates a client with an empty cookie jar
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` does not parse
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))?;

        Ok(self.http.request(method, url))
    }

    /// Sends a request and returns the raw response if it succeeded
    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "API request failed");

        Err(ClientError::from_status(status, &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.execute(self.request(Method::GET, path)?).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(method, path)?.json(body))
            .await?;
        Ok(response.json().await?)
    }

    // Session

    pub async fn login(&self, username: &str, password: &str) -> Result<PublicUser, ClientError> {
        self.send_json(
            Method::POST,
            "/api/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.execute(self.request(Method::POST, "/api/logout")?)
            .await?;
        Ok(())
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> Result<PublicUser, ClientError> {
        self.send_json(
            Method::POST,
            "/api/register",
            &json!({ "username": username, "password": password, "nickname": nickname }),
        )
        .await
    }

    pub async fn current_user(&self) -> Result<PublicUser, ClientError> {
        self.fetch("/api/user").await
    }

    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<PublicUser, ClientError> {
        self.send_json(Method::PATCH, "/api/user", patch).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.fetch("/health").await
    }

    // Users

    pub async fn list_users(&self) -> Result<Vec<PublicUser>, ClientError> {
        self.fetch("/api/users").await
    }

    pub async fn create_user(&self, account: &NewAccount) -> Result<PublicUser, ClientError> {
        self.send_json(Method::POST, "/api/users", account).await
    }

    pub async fn update_user(&self, id: i32, patch: &AccountPatch) -> Result<PublicUser, ClientError> {
        self.send_json(Method::PATCH, &format!("/api/users/{}", id), patch)
            .await
    }

    // Tasks

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.fetch("/api/tasks").await
    }

    pub async fn list_all_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.fetch("/api/admin/tasks").await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        self.send_json(Method::POST, "/api/tasks", task).await
    }

    pub async fn set_task_completed(&self, id: i32, completed: bool) -> Result<Task, ClientError> {
        self.send_json(
            Method::PATCH,
            &format!("/api/tasks/{}", id),
            &json!({ "completed": completed }),
        )
        .await
    }

    pub async fn approve_task(&self, id: i32, note: &str) -> Result<Task, ClientError> {
        self.approve("tasks", id, note).await
    }

    // Warnings

    pub async fn list_warnings(&self) -> Result<Vec<Warning>, ClientError> {
        self.fetch("/api/warnings").await
    }

    pub async fn list_all_warnings(&self) -> Result<Vec<Warning>, ClientError> {
        self.fetch("/api/admin/warnings").await
    }

    pub async fn create_warning(&self, user_id: i32, reason: &str) -> Result<Warning, ClientError> {
        self.send_json(
            Method::POST,
            "/api/warnings",
            &json!({ "userId": user_id, "reason": reason }),
        )
        .await
    }

    pub async fn approve_warning(&self, id: i32, note: &str) -> Result<Warning, ClientError> {
        self.approve("warnings", id, note).await
    }

    // Bans

    pub async fn list_bans(&self) -> Result<Vec<BanView>, ClientError> {
        self.fetch("/api/bans").await
    }

    pub async fn list_all_bans(&self) -> Result<Vec<BanView>, ClientError> {
        self.fetch("/api/admin/bans").await
    }

    /// Issues a ban; `expires_at: None` makes it permanent
    pub async fn create_ban(
        &self,
        user_id: i32,
        reason: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<BanView, ClientError> {
        self.send_json(
            Method::POST,
            "/api/bans",
            &json!({ "userId": user_id, "reason": reason, "expiresAt": expires_at }),
        )
        .await
    }

    pub async fn approve_ban(&self, id: i32, note: &str) -> Result<BanView, ClientError> {
        self.approve("bans", id, note).await
    }

    // Support tickets

    pub async fn list_tickets(&self) -> Result<Vec<SupportTicket>, ClientError> {
        self.fetch("/api/tickets").await
    }

    pub async fn list_all_tickets(&self) -> Result<Vec<SupportTicket>, ClientError> {
        self.fetch("/api/admin/tickets").await
    }

    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<SupportTicket, ClientError> {
        self.send_json(Method::POST, "/api/tickets", ticket).await
    }

    pub async fn update_ticket(
        &self,
        id: i32,
        patch: &TicketPatch,
    ) -> Result<SupportTicket, ClientError> {
        self.send_json(Method::PATCH, &format!("/api/admin/tickets/{}", id), patch)
            .await
    }

    async fn approve<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: i32,
        note: &str,
    ) -> Result<T, ClientError> {
        self.send_json(
            Method::POST,
            &format!("/api/{}/{}/approve", resource, id),
            &json!({ "note": note }),
        )
        .await
    }
}
