/// Server-side sessions
///
/// A successful login issues an opaque random token. The token itself only
/// ever lives in the client's cookie; the store is keyed by its SHA-256 so a
/// leaked store does not yield usable cookies.
///
/// # Lifecycle
///
/// ```text
/// login  ──issue──▶  session:{sha256(token)} = {user_id, created_at, expires_at}  (TTL)
/// request ─resolve─▶ record present and expires_at > now  → authenticated
/// logout ──revoke──▶ DEL session:{sha256(token)}          (no grace period)
/// ```
///
/// Users may hold any number of simultaneous sessions.
///
/// # Stores
///
/// - [`RedisSessionStore`]: production store, expiry enforced by Redis `EX`
/// - [`MemorySessionStore`]: in-process store for tests and local development
///
/// # Example
///
/// ```
/// use memberportal_shared::auth::session::{MemorySessionStore, SessionManager};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()), 3600);
///
/// let issued = sessions.issue(42).await?;
/// let session = sessions.resolve(&issued.token).await?.expect("live session");
/// assert_eq!(session.user_id, 42);
///
/// sessions.revoke(&issued.token).await?;
/// assert!(sessions.resolve(&issued.token).await?.is_none());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::redis::RedisClient;

/// Random bytes in a session token
const TOKEN_BYTES: usize = 32;

/// Redis key prefix for session records
const KEY_PREFIX: &str = "session:";

/// Longest accepted session lifetime (ten years)
pub const MAX_SESSION_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Backing store failed
    #[error("Session store error: {0}")]
    Store(String),

    /// Stored record could not be decoded
    #[error("Corrupt session record: {0}")]
    Corrupt(String),

    /// Configured lifetime exceeds [`MAX_SESSION_TTL_SECONDS`]
    #[error("Session TTL of {0} seconds is out of range")]
    InvalidTtl(u64),
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::Store(err.to_string())
    }
}

/// Session record persisted in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user
    pub user_id: i32,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A freshly issued session and the raw token for the cookie
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Raw token; only ever sent to the client
    pub token: String,

    pub session: Session,
}

/// Generates a new opaque session token (64 hex chars)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Store key for a raw token
pub fn session_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}{}", KEY_PREFIX, hex::encode(digest))
}

/// Durable session persistence with TTL-based expiry
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a record under `key` for `ttl_seconds`
    async fn put(&self, key: &str, session: &Session, ttl_seconds: u64) -> Result<(), SessionError>;

    /// Loads a record; expired or missing records yield `None`
    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError>;

    /// Deletes a record; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), SessionError>;

    /// Reports whether the backing store is reachable
    async fn is_healthy(&self) -> bool;
}

/// Issues, resolves and revokes sessions on top of a [`SessionStore`]
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl_seconds: u64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Session lifetime in seconds (also used as the cookie Max-Age)
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Issues a new session bound to `user_id`
    pub async fn issue(&self, user_id: i32) -> Result<IssuedSession, SessionError> {
        let token = generate_session_token();
        let created_at = Utc::now();
        let session = Session {
            user_id,
            created_at,
            expires_at: session_expiry(created_at, self.ttl_seconds)?,
        };

        self.store
            .put(&session_key(&token), &session, self.ttl_seconds)
            .await?;

        tracing::debug!(user_id, "Session issued");

        Ok(IssuedSession { token, session })
    }

    /// Resolves a raw token to a live session
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let session = self.store.get(&session_key(token)).await?;

        Ok(session.filter(|s| s.is_live_at(Utc::now())))
    }

    /// Deletes the session immediately
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        self.store.delete(&session_key(token)).await
    }

    pub async fn is_healthy(&self) -> bool {
        self.store.is_healthy().await
    }
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    client: RedisClient,
}

impl RedisSessionStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, key: &str, session: &Session, ttl_seconds: u64) -> Result<(), SessionError> {
        let value = serde_json::to_string(session).map_err(|e| SessionError::Corrupt(e.to_string()))?;
        let mut conn = self.client.get_connection();

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError> {
        let mut conn = self.client.get_connection();

        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;

        value
            .map(|raw| serde_json::from_str(&raw).map_err(|e| SessionError::Corrupt(e.to_string())))
            .transpose()
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        let mut conn = self.client.get_connection();

        redis::cmd("DEL").arg(key).query_async::<_, ()>(&mut conn).await?;

        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.client.ping().await.unwrap_or(false)
    }
}

fn session_expiry(created_at: DateTime<Utc>, ttl_seconds: u64) -> Result<DateTime<Utc>, SessionError> {
    if ttl_seconds > MAX_SESSION_TTL_SECONDS {
        return Err(SessionError::InvalidTtl(ttl_seconds));
    }

    i64::try_from(ttl_seconds)
        .ok()
        .and_then(|seconds| created_at.checked_add_signed(Duration::seconds(seconds)))
        .ok_or(SessionError::InvalidTtl(ttl_seconds))
}

/// In-process session store
///
/// Expiry is checked on read. Every `put` also sweeps expired records, so
/// sessions that are never read again do not accumulate.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, including not-yet-collected expired ones
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, key: &str, session: &Session, _ttl_seconds: u64) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        sessions.retain(|_, existing| existing.is_live_at(now));
        sessions.insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        match sessions.get(key) {
            Some(session) if session.is_live_at(now) => Ok(Some(session.clone())),
            Some(_) => {
                sessions.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
