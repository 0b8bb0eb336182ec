//! Password authentication for the back-office account.
//!
//! There is a single account configured through the environment. The stored
//! credential is an Argon2 PHC string; plaintext passwords never leave the
//! request handler.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::AdminCredentials;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Email or password did not match.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The configured hash could not be used.
    #[error("password hash error: {0}")]
    Hash(String),
}

/// Check a login attempt against the configured credentials.
///
/// The password hash is always verified, even when the email is wrong, so
/// both failures take the same time.
///
/// # Errors
///
/// Returns `AdminAuthError::InvalidCredentials` on any mismatch and
/// `AdminAuthError::Hash` if the configured hash is unusable.
pub fn verify_credentials(
    credentials: &AdminCredentials,
    email: &str,
    password: &str,
) -> Result<(), AdminAuthError> {
    let hash = PasswordHash::new(credentials.password_hash.expose_secret().trim())
        .map_err(|e| AdminAuthError::Hash(e.to_string()))?;

    let password_ok = Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok();
    let email_ok = credentials
        .email
        .as_str()
        .eq_ignore_ascii_case(email.trim());

    if password_ok && email_ok {
        Ok(())
    } else {
        Err(AdminAuthError::InvalidCredentials)
    }
}

/// Hash a password into an Argon2id PHC string with a fresh salt.
///
/// # Errors
///
/// Returns `AdminAuthError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AdminAuthError::Hash(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bloom_core::types::Email;
    use secrecy::SecretString;

    use super::*;

    fn credentials(password: &str) -> AdminCredentials {
        AdminCredentials::new(
            Email::parse("owner@bloom.test").unwrap(),
            SecretString::from(hash_password(password).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_correct_credentials() {
        let creds = credentials("roses-are-red");
        assert!(verify_credentials(&creds, "owner@bloom.test", "roses-are-red").is_ok());
        assert!(verify_credentials(&creds, " OWNER@bloom.test ", "roses-are-red").is_ok());
    }

    #[test]
    fn test_wrong_password_or_email() {
        let creds = credentials("roses-are-red");
        assert!(matches!(
            verify_credentials(&creds, "owner@bloom.test", "violets"),
            Err(AdminAuthError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_credentials(&creds, "someone@bloom.test", "roses-are-red"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }
}
