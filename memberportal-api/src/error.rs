/// Error handling and HTTP response mapping
///
/// Every handler returns [`ApiResult`]. Library errors convert into
/// [`ApiError`] through `From`, so handlers use `?` throughout.
///
/// # Response bodies
///
/// | Variant | Status | Body |
/// |---|---|---|
/// | `BadRequest` | 400 | plain text message |
/// | `Unauthorized` | 401 | empty |
/// | `NotFound` | 404 | JSON [`ErrorResponse`] |
/// | `ValidationError` | 422 | JSON [`ErrorResponse`] with `details` |
/// | `InternalError` | 500 | JSON [`ErrorResponse`], cause logged only |
///
/// Authentication and authorization failures both produce the empty 401.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use memberportal_shared::auth::{
    authorization::AuthzError, middleware::AuthError, password::PasswordError,
    session::SessionError,
};
use memberportal_shared::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Rejected input the caller can fix (400)
    BadRequest(String),

    /// Missing or expired session, or insufficient role (401)
    Unauthorized,

    /// Target row does not exist (404)
    NotFound(String),

    /// Field-level validation failed (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Anything else (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Unauthorized => return StatusCode::UNAUTHORIZED.into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(errors)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_duplicate_username() {
            return ApiError::BadRequest("Username already exists".to_string());
        }

        match err {
            StorageError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {} not found", entity, id))
            }
            StorageError::UniqueViolation(constraint) => {
                ApiError::BadRequest(format!("Constraint violation: {}", constraint))
            }
            StorageError::ForeignKeyViolation(_) => {
                ApiError::BadRequest("Referenced user does not exist".to_string())
            }
            StorageError::Database(e) => ApiError::InternalError(format!("Database error: {}", e)),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(_: AuthzError) -> Self {
        ApiError::Unauthorized
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => ApiError::Unauthorized,
            AuthError::Backend(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::InternalError(format!("Session store failed: {}", err))
    }
}
