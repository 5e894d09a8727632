//! Password hashing with Argon2id

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use tracing::error;

use crate::auth::token::SecurityError;

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> Result<String, SecurityError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
        error!("Failed to encode password salt: {}", e);
        SecurityError::Generic(e.to_string())
    })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            SecurityError::Generic(e.to_string())
        })
}

/// Check a password against a stored PHC string.
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}
