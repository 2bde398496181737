//! Password hashing via bcrypt.

use std::sync::LazyLock;

use tracing::warn;

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash a password with bcrypt. Every call draws a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Hash checked when no account matches, so an unknown username costs the
/// same bcrypt work as a wrong password.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    bcrypt::hash("todo-unknown-account", BCRYPT_COST).unwrap_or_else(|e| {
        warn!(error = %e, "could not build dummy password hash");
        String::new()
    })
});

/// Build the dummy hash ahead of the first login.
pub fn warm_up() {
    LazyLock::force(&DUMMY_HASH);
}

/// Spend one bcrypt verification on `password` for a login that has no
/// matching account.
pub fn verify_unknown_account(password: &str) {
    verify_password(password, &DUMMY_HASH);
}

/// Verify a password against a bcrypt hash.
///
/// Fails closed: a malformed stored hash verifies as `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, "stored password hash could not be parsed");
            false
        }
    }
}
