//! Argon2id password hashing for the local account fixture.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::StoreError;

/// Hashes a password using Argon2id with a random salt.
///
/// # Errors
///
/// Returns [`StoreError::Internal`] if hashing fails.
pub async fn hash_password(password: &str) -> Result<String, StoreError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| StoreError::Internal(format!("password hashing task failed: {e}")))?
}

/// Verifies a password against a stored PHC hash string.
///
/// # Errors
///
/// Returns [`StoreError::InvalidCredentials`] on mismatch or an unreadable
/// hash.
pub async fn verify_password(password: &str, hash: &str) -> Result<(), StoreError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || verify_blocking(&password, &hash))
        .await
        .map_err(|e| StoreError::Internal(format!("password verification task failed: {e}")))?
}

fn hash_blocking(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Internal(format!("password hashing failed: {e}")))
}

fn verify_blocking(password: &str, hash: &str) -> Result<(), StoreError> {
    let parsed = PasswordHash::new(hash).map_err(|_| StoreError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| StoreError::InvalidCredentials)
}
