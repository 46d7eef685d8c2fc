/// Permission tiers for portal accounts
///
/// A single enumerated role replaces the `is_admin` / `is_mod` flag pair and
/// the free-text role column. The flags survive only as derived values in API
/// responses and as optional inputs on user creation.
///
/// # Hierarchy
///
/// ```text
/// admin > moderator > member
/// ```
///
/// # Example
///
/// ```
/// use memberportal_shared::models::role::Role;
///
/// assert!(Role::Admin.has_permission(Role::Moderator));
/// assert!(!Role::Member.has_permission(Role::Moderator));
/// assert_eq!(Role::from_legacy_flags(false, true), Role::Moderator);
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages users and issues tasks, warnings and bans
    Admin,

    /// Approves moderation records and triages support tickets
    #[serde(alias = "mod")]
    Moderator,

    /// Default tier: sees only their own records
    #[default]
    #[serde(alias = "user")]
    Member,
}

impl Role {
    /// Converts role to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Member => "member",
        }
    }

    /// Human-readable label, as shown next to the username in the portal
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Moderator => "Moderator",
            Role::Member => "Member",
        }
    }

    /// Reconciles the legacy boolean flags into a role
    ///
    /// `is_admin` wins over `is_mod` when both are set.
    pub fn from_legacy_flags(is_admin: bool, is_mod: bool) -> Self {
        if is_admin {
            Role::Admin
        } else if is_mod {
            Role::Moderator
        } else {
            Role::Member
        }
    }

    /// Derived legacy `isAdmin` flag
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Derived legacy `isMod` flag
    pub fn is_moderator(&self) -> bool {
        matches!(self, Role::Moderator)
    }

    /// Checks if this role has at least the permission level of `required`
    pub fn has_permission(&self, required: Role) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Moderator => 2,
            Role::Member => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "moderator" | "mod" => Ok(Role::Moderator),
            "member" | "user" => Ok(Role::Member),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
