/// Session-cookie authentication middleware for Axum
///
/// The middleware reads the session cookie, resolves it through the
/// [`SessionManager`], loads the user from storage and adds an
/// [`AuthContext`] to the request extensions. Any failure to get from cookie
/// to live user is a 401 with an empty body.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use memberportal_shared::auth::middleware::{session_auth_middleware, AuthContext, SessionAuth};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.username)
/// }
///
/// fn protected(auth: SessionAuth) -> Router {
///     Router::new()
///         .route("/api/whoami", get(whoami))
///         .route_layer(middleware::from_fn_with_state(auth, session_auth_middleware))
/// }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::session::{SessionError, SessionManager};
use crate::models::{Role, User};
use crate::storage::{SharedStorage, StorageError};

/// Default session cookie name
pub const DEFAULT_SESSION_COOKIE: &str = "portal_session";

/// Authenticated caller, added to request extensions
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i32,
    pub username: String,

    /// Role as of this request; role changes apply on the next request
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: i32, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No cookie, unknown or expired session, or the user no longer exists
    #[error("Not authenticated")]
    Unauthenticated,

    /// Session store or storage failed
    #[error("Authentication backend error: {0}")]
    Backend(String),
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        AuthError::Backend(err.to_string())
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::Backend(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED.into_response(),
            AuthError::Backend(msg) => {
                tracing::error!("Authentication backend error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "internal_error",
                        "message": "An internal error occurred",
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// Cookie attributes for the session token
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,

    /// Adds `Secure`; set when served over HTTPS
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SESSION_COOKIE.to_string(),
            secure: false,
        }
    }
}

impl CookieSettings {
    /// `Set-Cookie` value carrying a freshly issued token
    pub fn session_cookie(&self, token: &str, max_age_seconds: u64) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, token, max_age_seconds
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }

    /// `Set-Cookie` value that makes the browser drop the cookie
    pub fn clear_cookie(&self) -> Option<HeaderValue> {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }

    /// Reads the session token from the `Cookie` header
    pub fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| key.trim() == self.name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Everything the middleware needs to authenticate a request
#[derive(Clone)]
pub struct SessionAuth {
    pub sessions: SessionManager,
    pub storage: SharedStorage,
    pub cookie: CookieSettings,
}

impl SessionAuth {
    /// Resolves request headers to the calling user
    ///
    /// # Errors
    ///
    /// `AuthError::Unauthenticated` when the cookie is missing, the session
    /// is unknown or expired, or the session's user was removed
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = self
            .cookie
            .extract_token(headers)
            .ok_or(AuthError::Unauthenticated)?;

        let session = self
            .sessions
            .resolve(&token)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        let user = self
            .storage
            .get_user(session.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        Ok(AuthContext::from_user(&user))
    }
}

/// Rejects unauthenticated requests and attaches [`AuthContext`] otherwise
pub async fn session_auth_middleware(
    State(auth): State<SessionAuth>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = match auth.authenticate(req.headers()).await {
        Ok(context) => context,
        Err(AuthError::Unauthenticated) => {
            tracing::debug!(path = %req.uri().path(), "Rejected unauthenticated request");
            return Err(AuthError::Unauthenticated);
        }
        Err(e) => return Err(e),
    };

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Rejects callers below `required` before the handler sees the request
///
/// Layered inside [`session_auth_middleware`], so the body of a privileged
/// route is never parsed for an under-privileged caller. A missing
/// [`AuthContext`] is treated as unauthenticated.
pub async fn require_role_middleware(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(auth) = req.extensions().get::<AuthContext>() else {
        return Err(AuthError::Unauthenticated);
    };

    if !auth.role.has_permission(required) {
        tracing::debug!(
            user_id = auth.user_id,
            required = %required,
            actual = %auth.role,
            path = %req.uri().path(),
            "Rejected request below required role"
        );
        return Err(AuthError::Unauthenticated);
    }

    Ok(next.run(req).await)
}
