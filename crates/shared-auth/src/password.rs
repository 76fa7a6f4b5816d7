//! Password hashing for the auth responder's user store.

use bcrypt::{hash, verify, DEFAULT_COST};
use thiserror::Error;

/// Hashing or verification failure (malformed stored hash, cost issues).
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    Ok(hash(plain, DEFAULT_COST)?)
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, PasswordError> {
    Ok(verify(plain, hashed)?)
}
