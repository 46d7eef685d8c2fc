/// First-admin bootstrap
///
/// Runs once at startup. With `BOOTSTRAP_ADMIN_PASSWORD` set and no user
/// named `BOOTSTRAP_ADMIN_USERNAME`, that admin is created. An existing user
/// of that name is left untouched whatever its role or password.

use crate::config::BootstrapConfig;
use memberportal_shared::{
    auth::password,
    models::{NewUser, Role},
    storage::SharedStorage,
};

/// What [`ensure_bootstrap_admin`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created { user_id: i32 },
    AlreadyExists,

    /// No password configured
    Skipped,
}

/// Creates the bootstrap admin if it is configured and missing
///
/// # Errors
///
/// Returns an error if storage fails or the password cannot be hashed
pub async fn ensure_bootstrap_admin(
    storage: &SharedStorage,
    config: &BootstrapConfig,
) -> anyhow::Result<BootstrapOutcome> {
    if storage
        .get_user_by_username(&config.admin_username)
        .await?
        .is_some()
    {
        tracing::debug!(username = %config.admin_username, "Bootstrap admin already present");
        return Ok(BootstrapOutcome::AlreadyExists);
    }

    let Some(admin_password) = config.admin_password.clone() else {
        tracing::warn!(
            username = %config.admin_username,
            "BOOTSTRAP_ADMIN_PASSWORD not set; no admin account was created"
        );
        return Ok(BootstrapOutcome::Skipped);
    };

    let password_hash = password::hash_password_async(admin_password).await?;

    let created = storage
        .create_user(NewUser {
            username: config.admin_username.clone(),
            password_hash,
            role: Role::Admin,
            nickname: None,
            preferences: None,
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
            Ok(BootstrapOutcome::Created { user_id: user.id })
        }
        // Another instance won the race
        Err(err) if err.is_duplicate_username() => {
            Ok(BootstrapOutcome::AlreadyExists)
        }
        Err(err) => Err(err.into()),
    }
}
