/// Cached view of the portal API
///
/// [`CachedPortal`] serves list and profile reads from a [`QueryCache`] and
/// invalidates the affected tags after every successful mutation. It never
/// edits cached data in place; a mutation only makes the next read refetch.
///
/// | Mutation | Invalidates |
/// |---|---|
/// | login, logout, register | everything (cache cleared) |
/// | profile update | `CurrentUser`, `Users` |
/// | create user | `Users` |
/// | update user | `Users`, `CurrentUser` |
/// | task create / complete / approve | `Tasks` |
/// | warning create / approve | `Warnings` |
/// | ban create / approve | `Bans` |
/// | ticket create / update | `Tickets` |

use crate::cache::{FetchStatus, QueryCache, ResourceTag};
use crate::client::{AccountPatch, NewAccount, NewTask, NewTicket, PortalClient, ProfilePatch, TicketPatch};
use crate::error::ClientError;
use crate::stats::DashboardStats;
use chrono::{DateTime, Utc};
use memberportal_shared::models::{BanView, PublicUser, SupportTicket, Task, Warning};
use std::future::Future;
use tokio::sync::Mutex;

const CURRENT_USER: &str = "/api/user";
const USERS: &str = "/api/users";
const TASKS: &str = "/api/tasks";
const ALL_TASKS: &str = "/api/admin/tasks";
const WARNINGS: &str = "/api/warnings";
const ALL_WARNINGS: &str = "/api/admin/warnings";
const BANS: &str = "/api/bans";
const ALL_BANS: &str = "/api/admin/bans";
const TICKETS: &str = "/api/tickets";
const ALL_TICKETS: &str = "/api/admin/tickets";

pub struct CachedPortal {
    client: PortalClient,
    cache: Mutex<QueryCache>,
}

impl CachedPortal {
    pub fn new(client: PortalClient) -> Self {
        Self {
            client,
            cache: Mutex::new(QueryCache::new()),
        }
    }

    /// Uncached client for calls this wrapper does not cover
    pub fn client(&self) -> &PortalClient {
        &self.client
    }

    pub async fn status(&self, tag: ResourceTag, path: &str) -> FetchStatus {
        self.cache.lock().await.status(tag, path)
    }

    /// Returns the fresh cached value, or fetches and caches it
    ///
    /// The lock is not held across the fetch; two concurrent misses both go
    /// to the server and the later insert wins. A mutation that invalidates
    /// `tag` mid-fetch leaves the stored response stale.
    async fn read<T, F, Fut>(&self, tag: ResourceTag, path: &str, fetch: F) -> Result<T, ClientError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let generation = {
            let cache = self.cache.lock().await;
            if let Some(value) = cache.get_fresh::<T>(tag, path) {
                return Ok(value);
            }
            cache.generation(tag)
        };

        let value = fetch().await?;
        self.cache
            .lock()
            .await
            .insert_fetched(tag, path, value.clone(), generation);

        Ok(value)
    }

    async fn invalidate(&self, tags: &[ResourceTag]) {
        self.cache.lock().await.invalidate_all(tags);
    }

    async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    // Session

    pub async fn login(&self, username: &str, password: &str) -> Result<PublicUser, ClientError> {
        let user = self.client.login(username, password).await?;
        self.clear().await;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.client.logout().await?;
        self.clear().await;
        Ok(())
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> Result<PublicUser, ClientError> {
        let user = self.client.register(username, password, nickname).await?;
        self.clear().await;
        Ok(user)
    }

    pub async fn current_user(&self) -> Result<PublicUser, ClientError> {
        self.read(ResourceTag::CurrentUser, CURRENT_USER, || {
            self.client.current_user()
        })
        .await
    }

    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<PublicUser, ClientError> {
        let user = self.client.update_profile(patch).await?;
        self.invalidate(&[ResourceTag::CurrentUser, ResourceTag::Users])
            .await;
        Ok(user)
    }

    // Users

    pub async fn users(&self) -> Result<Vec<PublicUser>, ClientError> {
        self.read(ResourceTag::Users, USERS, || self.client.list_users())
            .await
    }

    pub async fn create_user(&self, account: &NewAccount) -> Result<PublicUser, ClientError> {
        let user = self.client.create_user(account).await?;
        self.invalidate(&[ResourceTag::Users]).await;
        Ok(user)
    }

    pub async fn update_user(&self, id: i32, patch: &AccountPatch) -> Result<PublicUser, ClientError> {
        let user = self.client.update_user(id, patch).await?;
        self.invalidate(&[ResourceTag::Users, ResourceTag::CurrentUser])
            .await;
        Ok(user)
    }

    // Tasks

    pub async fn tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.read(ResourceTag::Tasks, TASKS, || self.client.list_tasks())
            .await
    }

    pub async fn all_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.read(ResourceTag::Tasks, ALL_TASKS, || self.client.list_all_tasks())
            .await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        let task = self.client.create_task(task).await?;
        self.invalidate(&[ResourceTag::Tasks]).await;
        Ok(task)
    }

    pub async fn set_task_completed(&self, id: i32, completed: bool) -> Result<Task, ClientError> {
        let task = self.client.set_task_completed(id, completed).await?;
        self.invalidate(&[ResourceTag::Tasks]).await;
        Ok(task)
    }

    pub async fn approve_task(&self, id: i32, note: &str) -> Result<Task, ClientError> {
        let task = self.client.approve_task(id, note).await?;
        self.invalidate(&[ResourceTag::Tasks]).await;
        Ok(task)
    }

    // Warnings

    pub async fn warnings(&self) -> Result<Vec<Warning>, ClientError> {
        self.read(ResourceTag::Warnings, WARNINGS, || self.client.list_warnings())
            .await
    }

    pub async fn all_warnings(&self) -> Result<Vec<Warning>, ClientError> {
        self.read(ResourceTag::Warnings, ALL_WARNINGS, || {
            self.client.list_all_warnings()
        })
        .await
    }

    pub async fn create_warning(&self, user_id: i32, reason: &str) -> Result<Warning, ClientError> {
        let warning = self.client.create_warning(user_id, reason).await?;
        self.invalidate(&[ResourceTag::Warnings]).await;
        Ok(warning)
    }

    pub async fn approve_warning(&self, id: i32, note: &str) -> Result<Warning, ClientError> {
        let warning = self.client.approve_warning(id, note).await?;
        self.invalidate(&[ResourceTag::Warnings]).await;
        Ok(warning)
    }

    // Bans

    pub async fn bans(&self) -> Result<Vec<BanView>, ClientError> {
        self.read(ResourceTag::Bans, BANS, || self.client.list_bans())
            .await
    }

    pub async fn all_bans(&self) -> Result<Vec<BanView>, ClientError> {
        self.read(ResourceTag::Bans, ALL_BANS, || self.client.list_all_bans())
            .await
    }

    pub async fn create_ban(
        &self,
        user_id: i32,
        reason: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<BanView, ClientError> {
        let ban = self.client.create_ban(user_id, reason, expires_at).await?;
        self.invalidate(&[ResourceTag::Bans]).await;
        Ok(ban)
    }

    pub async fn approve_ban(&self, id: i32, note: &str) -> Result<BanView, ClientError> {
        let ban = self.client.approve_ban(id, note).await?;
        self.invalidate(&[ResourceTag::Bans]).await;
        Ok(ban)
    }

    // Support tickets

    pub async fn tickets(&self) -> Result<Vec<SupportTicket>, ClientError> {
        self.read(ResourceTag::Tickets, TICKETS, || self.client.list_tickets())
            .await
    }

    pub async fn all_tickets(&self) -> Result<Vec<SupportTicket>, ClientError> {
        self.read(ResourceTag::Tickets, ALL_TICKETS, || {
            self.client.list_all_tickets()
        })
        .await
    }

    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<SupportTicket, ClientError> {
        let ticket = self.client.create_ticket(ticket).await?;
        self.invalidate(&[ResourceTag::Tickets]).await;
        Ok(ticket)
    }

    pub async fn update_ticket(
        &self,
        id: i32,
        patch: &TicketPatch,
    ) -> Result<SupportTicket, ClientError> {
        let ticket = self.client.update_ticket(id, patch).await?;
        self.invalidate(&[ResourceTag::Tickets]).await;
        Ok(ticket)
    }

    /// Home dashboard counters from the caller's cached tasks, warnings and bans
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let tasks = self.tasks().await?;
        let warnings = self.warnings().await?;
        let bans = self.bans().await?;

        Ok(DashboardStats::compute(&tasks, &warnings, &bans, Utc::now()))
    }
}
