/// API route handlers
///
/// Each handler runs its guard first (role or ownership), then makes its
/// storage calls. Authentication already happened in the session middleware,
/// which puts an `AuthContext` in the request extensions.
///
/// - `health`: liveness and dependency status
/// - `auth`: login, logout, registration, own profile
/// - `users`: admin account management
/// - `tasks`, `warnings`, `bans`: member records and their approvals
/// - `tickets`: support tickets and triage

pub mod auth;
pub mod bans;
pub mod health;
pub mod tasks;
pub mod tickets;
pub mod users;
pub mod warnings;

use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Body of the `POST /api/{tasks,warnings,bans}/:id/approve` routes
#[derive(Debug, Deserialize, Validate)]
pub struct ApprovalRequest {
    #[validate(length(min = 1, message = "Note is required"))]
    pub note: String,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
