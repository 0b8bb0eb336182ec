//! Back-office account helpers.
//!
//! # Usage
//!
//! ```bash
//! export ADMIN_PASSWORD_HASH="$(bloom-cli admin hash-password 'secret')"
//! ```

use super::CommandError;

/// Shortest password accepted for the back-office account.
const MIN_PASSWORD_LEN: usize = 12;

/// Print an Argon2id hash of `password` to stdout.
///
/// # Errors
///
/// Returns `CommandError::Validation` for short passwords.
pub fn hash_password(password: &str) -> Result<(), CommandError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CommandError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let hash = bloom_admin::services::hash_password(password)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            hash_password("short"),
            Err(CommandError::Validation(_))
        ));
    }
}
