/// Role and ownership checks
///
/// Authentication has already happened by the time these run: the session
/// middleware resolved the cookie to an [`AuthContext`]. The checks here
/// only compare the caller's role (and id) against what a route requires.
///
/// # Precedence
///
/// 1. authenticated (enforced by the middleware)
/// 2. role: `admin` for admin routes, `moderator` or above for moderation
/// 3. ownership, for routes acting on a member's own record
///
/// # Example
///
/// ```
/// use memberportal_shared::auth::authorization::{require_admin, require_owner_or_admin};
/// use memberportal_shared::auth::middleware::AuthContext;
/// use memberportal_shared::models::Role;
///
/// let member = AuthContext::new(5, "bob", Role::Member);
///
/// assert!(require_admin(&member).is_err());
/// assert!(require_owner_or_admin(&member, 5).is_ok());
/// assert!(require_owner_or_admin(&member, 6).is_err());
/// ```

use super::middleware::AuthContext;
use crate::models::Role;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role is below the route's requirement
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    /// Caller neither owns the resource nor holds an overriding role
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Requires at least `required` in the role hierarchy
pub fn require_role(auth: &AuthContext, required: Role) -> Result<(), AuthzError> {
    if auth.role.has_permission(required) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = auth.user_id,
            required = %required,
            actual = %auth.role,
            "Role check failed"
        );
        Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        })
    }
}

pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, Role::Admin)
}

/// Moderators and admins
pub fn require_moderator(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, Role::Moderator)
}

/// Allows the resource owner, or anyone holding `override_role` or above
pub fn require_owner_or_role(
    auth: &AuthContext,
    owner_id: i32,
    override_role: Role,
) -> Result<(), AuthzError> {
    if auth.user_id == owner_id || auth.role.has_permission(override_role) {
        return Ok(());
    }

    tracing::debug!(user_id = auth.user_id, owner_id, "Ownership check failed");
    Err(AuthzError::NotOwner)
}

pub fn require_owner_or_admin(auth: &AuthContext, owner_id: i32) -> Result<(), AuthzError> {
    require_owner_or_role(auth, owner_id, Role::Admin)
}
