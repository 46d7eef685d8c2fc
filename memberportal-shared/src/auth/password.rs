/// Password hashing using Argon2id
///
/// Stored credentials use the compact form `hex(derived_key) + "." + hex(salt)`.
/// The KDF parameters are fixed, so they are not embedded in the stored form.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 64-byte derived key
/// - **Salt**: 16 random bytes from the OS RNG
///
/// Verification re-derives the key with the stored salt and compares the two
/// keys in constant time.
///
/// # Example
///
/// ```
/// use memberportal_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("pw1")?;
/// assert!(verify_password("pw1", &hash)?);
/// assert!(!verify_password("pw2", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};

/// Argon2 memory cost in KiB
const MEMORY_COST_KIB: u32 = 65536;

/// Argon2 passes
const TIME_COST: u32 = 3;

/// Argon2 lanes
const PARALLELISM: u32 = 4;

/// Length of the derived key in bytes
pub const KEY_LEN: usize = 64;

/// Length of the generated salt in bytes
pub const SALT_LEN: usize = 16;

const SEPARATOR: char = '.';

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Stored hash is not in `hex(key).hex(salt)` form
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// Blocking hash task did not complete
    #[error("Password task failed: {0}")]
    TaskFailed(String),
}

fn kdf() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(KEY_LEN))
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], PasswordError> {
    let mut key = [0u8; KEY_LEN];
    kdf()?
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| PasswordError::HashError(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

/// Hashes a password with a fresh random salt
///
/// # Returns
///
/// `hex(derived_key).hex(salt)`, 128 + 1 + 32 characters
///
/// # Errors
///
/// Returns `PasswordError::HashError` if key derivation fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let key = derive_key(password, &salt)?;

    Ok(format!("{}{}{}", hex::encode(key), SEPARATOR, hex::encode(salt)))
}

/// Verifies a password against a stored hash
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` when the stored form is malformed
/// (missing separator, non-hex halves, unusable salt). A malformed hash is
/// never reported as a mismatch.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let (key_hex, salt_hex) = stored
        .split_once(SEPARATOR)
        .ok_or_else(|| PasswordError::InvalidHash("missing '.' separator".to_string()))?;

    let stored_key = hex::decode(key_hex)
        .map_err(|e| PasswordError::InvalidHash(format!("key is not hex: {}", e)))?;
    let salt = hex::decode(salt_hex)
        .map_err(|e| PasswordError::InvalidHash(format!("salt is not hex: {}", e)))?;

    if stored_key.len() != KEY_LEN {
        return Err(PasswordError::InvalidHash(format!(
            "expected {} key bytes, found {}",
            KEY_LEN,
            stored_key.len()
        )));
    }

    let mut candidate = [0u8; KEY_LEN];
    kdf()?
        .hash_password_into(password.as_bytes(), &salt, &mut candidate)
        .map_err(|e| PasswordError::InvalidHash(format!("unusable salt: {}", e)))?;

    Ok(constant_time_eq(&candidate, &stored_key))
}

/// Compares two byte slices without short-circuiting on the first difference
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

/// Hashes on the blocking pool so the calling task yields during derivation
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

/// Verifies on the blocking pool so the calling task yields during derivation
pub async fn verify_password_async(password: String, stored: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}
