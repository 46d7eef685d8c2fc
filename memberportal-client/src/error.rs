/// Client error type
///
/// Maps the API's status codes back onto variants a caller can match on.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, TLS or body decoding failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Base URL could not be joined with a route path
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// 401: no session, expired session or insufficient role
    #[error("Unauthorized")]
    Unauthorized,

    /// 400 with the server's plain-text reason
    #[error("Rejected: {0}")]
    Rejected(String),

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// 422 with the offending field names
    #[error("Validation failed for: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Any other non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
}

impl ClientError {
    /// Builds the error for a non-success response body
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::BAD_REQUEST => ClientError::Rejected(body.to_string()),
            StatusCode::NOT_FOUND => ClientError::NotFound(json_message(body)),
            StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation(json_fields(body)),
            other => ClientError::Server {
                status: other.as_u16(),
                message: json_message(body),
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

fn json_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn json_fields(body: &str) -> Vec<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v["details"].as_array().map(|details| {
                details
                    .iter()
                    .filter_map(|d| d["field"].as_str().map(str::to_string))
                    .collect()
            })
        })
        .unwrap_or_default()
}
