use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::CoreError;

/// Hash `password` into a PHC string with a fresh salt.
///
/// Runs on the blocking pool; argon2 is deliberately slow.
pub(crate) async fn hash(password: String) -> Result<String, CoreError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CoreError::Auth(format!("failed to hash password: {e}")))
    })
    .await
    .map_err(|e| CoreError::Auth(format!("hashing task failed: {e}")))?
}

/// Check `password` against a stored PHC hash.
///
/// An unparseable hash counts as a mismatch.
pub(crate) async fn verify(password: String, phc: String) -> Result<bool, CoreError> {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&phc) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| CoreError::Auth(format!("verification task failed: {e}")))
}
