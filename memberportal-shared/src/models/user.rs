/// User model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     username TEXT NOT NULL UNIQUE,
///     password TEXT NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     nickname TEXT,
///     preferences JSONB
/// );
/// ```
///
/// The `password` column holds the `hex(key).hex(salt)` form produced by
/// [`crate::auth::password::hash_password`]. It is never serialized; API
/// responses go through [`PublicUser`].

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::role::Role;

/// Theme settings chosen by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// User account row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Server-generated serial id
    pub id: i32,

    /// Unique login name
    pub username: String,

    /// Salted password hash (never plaintext)
    pub password: String,

    /// Permission tier
    pub role: Role,

    /// Optional display name
    pub nickname: Option<String>,

    /// Optional theme settings
    pub preferences: Option<Json<Preferences>>,
}

impl User {
    /// Display name: nickname when set, username otherwise
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

/// User as exposed over the API
///
/// Carries the derived legacy `isAdmin` / `isMod` flags so existing portal
/// views keep working against the single `role` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub is_admin: bool,
    pub is_mod: bool,
    pub nickname: Option<String>,
    pub preferences: Option<Preferences>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            is_admin: user.role.is_admin(),
            is_mod: user.role.is_moderator(),
            nickname: user.nickname.clone(),
            preferences: user.preferences.as_ref().map(|p| p.0.clone()),
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser::from(&user)
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,

    /// Already-hashed password
    pub password_hash: String,

    pub role: Role,
    pub nickname: Option<String>,
    pub preferences: Option<Preferences>,
}

/// Patch applied to an existing user
///
/// `None` leaves a field untouched. For nullable columns `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub nickname: Option<Option<String>>,
    pub preferences: Option<Option<Preferences>>,
}

impl UpdateUser {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.password_hash.is_none()
            && self.role.is_none()
            && self.nickname.is_none()
            && self.preferences.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: Role) -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            password: "deadbeef.cafebabe".to_string(),
            role,
            nickname: None,
            preferences: Some(Json(Preferences {
                theme: Some("dark".to_string()),
                ..Default::default()
            })),
        }
    }

    #[test]
    fn test_public_user_derives_flags() {
        let admin = PublicUser::from(&sample_user(Role::Admin));
        assert!(admin.is_admin);
        assert!(!admin.is_mod);

        let moderator = PublicUser::from(&sample_user(Role::Moderator));
        assert!(!moderator.is_admin);
        assert!(moderator.is_mod);
    }

    #[test]
    fn test_public_user_hides_password() {
        let json = serde_json::to_value(PublicUser::from(sample_user(Role::Member))).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["preferences"]["theme"], "dark");
    }

    #[test]
    fn test_display_name() {
        let mut user = sample_user(Role::Member);
        assert_eq!(user.display_name(), "alice");
        user.nickname = Some("Al".to_string());
        assert_eq!(user.display_name(), "Al");
    }

    #[test]
    fn test_update_user_default_is_empty() {
        assert!(UpdateUser::default().is_empty());
        let update = UpdateUser {
            nickname: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
