//! Input length rules, checked before anything reaches storage.

use super::AuthError;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 3;
pub const PASSWORD_MAX_CHARS: usize = 128;

/// Check a username is 3–50 characters.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    check_len("Username", username, USERNAME_MIN_CHARS, USERNAME_MAX_CHARS)
}

/// Check a password is 3–128 characters.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    check_len("Password", password, PASSWORD_MIN_CHARS, PASSWORD_MAX_CHARS)
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), AuthError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AuthError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}
