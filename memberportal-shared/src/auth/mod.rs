/// Authentication and authorization
///
/// - [`password`]: Argon2id credential hashing in `hex(key).hex(salt)` form
/// - [`session`]: opaque session tokens and their stores
/// - [`middleware`]: cookie → session → user resolution for Axum
/// - [`authorization`]: role and ownership checks
///
/// # Example
///
/// ```
/// use memberportal_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod session;
