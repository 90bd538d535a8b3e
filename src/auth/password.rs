use argon2::{
    password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use super::provider::{AuthError, AuthErrorCode, AuthResult};

fn backend_failure(stage: &str, e: HashError) -> AuthError {
    error!(error = %e, stage, "argon2 failure");
    AuthError::with_message(AuthErrorCode::Internal, format!("{stage}: {e}"))
}

/// PHC-format argon2id hash with a fresh salt.
pub fn hash_password(plain: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| backend_failure("hash", e))
}

/// `Ok(())` on a match, `auth/wrong-password` on a mismatch.
/// An unreadable stored hash is an internal error, not a wrong password.
pub fn check_password(plain: &str, stored: &str) -> AuthResult<()> {
    let parsed = PasswordHash::new(stored).map_err(|e| backend_failure("parse stored hash", e))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(HashError::Password) => Err(AuthError::new(AuthErrorCode::WrongPassword)),
        Err(e) => Err(backend_failure("verify", e)),
    }
}
