/// Ban model and activity rules
///
/// A ban suspends a member until `expires_at`, or forever when `expires_at`
/// is null. Whether a ban is active is never stored: it is evaluated against
/// the current time whenever bans are read.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE bans (
///     id SERIAL PRIMARY KEY,
///     user_id INTEGER NOT NULL REFERENCES users(id),
///     reason TEXT NOT NULL,
///     expires_at TIMESTAMPTZ,
///     issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     issued_by INTEGER NOT NULL REFERENCES users(id),
///     approved BOOLEAN NOT NULL DEFAULT FALSE,
///     approved_by INTEGER REFERENCES users(id),
///     approval_note TEXT
/// );
/// ```
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use memberportal_shared::models::ban::{partition_by_activity, Ban};
///
/// # fn ban(expires_at: Option<chrono::DateTime<Utc>>) -> Ban {
/// #     Ban { id: 1, user_id: 5, reason: "spam".into(), expires_at,
/// #           issued_at: Utc::now(), issued_by: 1, approved: false,
/// #           approved_by: None, approval_note: None }
/// # }
/// let now = Utc::now();
/// let bans = vec![ban(None), ban(Some(now - Duration::days(1)))];
/// let (active, expired) = partition_by_activity(bans, now);
/// assert_eq!(active.len(), 1);
/// assert_eq!(expired.len(), 1);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ban row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ban {
    pub id: i32,
    pub user_id: i32,
    pub reason: String,

    /// End of the suspension; `None` means permanent
    pub expires_at: Option<DateTime<Utc>>,

    pub issued_at: DateTime<Utc>,
    pub issued_by: i32,
    pub approved: bool,
    pub approved_by: Option<i32>,
    pub approval_note: Option<String>,
}

/// Activity of a ban at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BanStatus {
    Active,
    Expired,
}

impl Ban {
    /// A ban is active iff it has no expiry or the expiry is after `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }

    /// Convenience wrapper evaluating against the wall clock
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> BanStatus {
        if self.is_active_at(now) {
            BanStatus::Active
        } else {
            BanStatus::Expired
        }
    }
}

/// Splits bans into `(active, expired)` at `now`, preserving order
pub fn partition_by_activity(bans: Vec<Ban>, now: DateTime<Utc>) -> (Vec<Ban>, Vec<Ban>) {
    bans.into_iter().partition(|ban| ban.is_active_at(now))
}

/// Ban as returned by the API, with activity evaluated at read time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanView {
    #[serde(flatten)]
    pub ban: Ban,

    pub active: bool,
    pub status: BanStatus,
}

impl BanView {
    pub fn at(ban: Ban, now: DateTime<Utc>) -> Self {
        let status = ban.status_at(now);
        Self {
            ban,
            active: status == BanStatus::Active,
            status,
        }
    }
}

/// Input for issuing a ban
#[derive(Debug, Clone)]
pub struct NewBan {
    pub user_id: i32,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_by: i32,
}
