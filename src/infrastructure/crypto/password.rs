//! Password hashing utilities

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::shared::InfraError;

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// Hash on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, InfraError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| InfraError::Crypto(format!("hashing task failed: {}", e)))?
        .map_err(|e| InfraError::Crypto(e.to_string()))
}
