//! Credential verification: password hashing and login checks.

use crate::config::BootstrapAdmin;
use crate::db::{user_create, user_find_by_username, DbPool, UserRow};
use crate::error::{AppError, AppResult};
use crate::models::Role;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{info, warn};

pub struct CredentialVerifier;

impl CredentialVerifier {
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// Constant-time comparison of `password` against a stored PHC hash.
    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Look up `username` and check `password` against its stored hash.
    pub async fn verify(pool: &DbPool, username: &str, password: &str) -> AppResult<UserRow> {
        let user = user_find_by_username(pool, username).await?.ok_or_else(|| {
            warn!(username = %username, "login for unknown user");
            AppError::NotFound("User not found".to_string())
        })?;

        if !Self::verify_password(password, &user.password_hash)? {
            warn!(username = %username, "login with wrong password");
            return Err(AppError::Unauthorized(
                "Incorrect username or password".to_string(),
            ));
        }

        if !user.is_active {
            warn!(username = %username, "login for inactive user");
            return Err(AppError::Validation("Inactive user".to_string()));
        }

        Ok(user)
    }
}

/// Create the configured admin account unless the username is already taken.
pub async fn ensure_bootstrap_admin(pool: &DbPool, admin: &BootstrapAdmin) -> AppResult<()> {
    if user_find_by_username(pool, &admin.username).await?.is_some() {
        return Ok(());
    }
    let hash = CredentialVerifier::hash_password(&admin.password)?;
    let user = user_create(pool, &admin.username, &admin.email, &hash, Role::Admin).await?;
    info!(username = %user.username, "bootstrap admin created");
    Ok(())
}
