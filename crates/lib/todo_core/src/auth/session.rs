//! Registration, login and logout flows built on the credential store and
//! token issuer.

use chrono::Duration;
use sqlx::PgPool;
use tracing::{info, warn};

use super::AuthError;
use super::password::{hash_password, verify_password, verify_unknown_account};
use super::queries;
use super::tokens::{issue_token, revoke_token};
use super::validation::{validate_password, validate_username};
use crate::models::auth::{AuthToken, User};

/// Issuance attempts before giving up on repeated token collisions.
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Register a new user account.
pub async fn register(pool: &PgPool, username: &str, password: &str) -> Result<User, AuthError> {
    validate_username(username)?;
    validate_password(password)?;

    let pw_hash = hash_password(password)?;
    let user = queries::create_user(pool, username, &pw_hash).await?;
    info!(user_id = user.id, "user registered");
    Ok(user)
}

/// Authenticate with username + password and issue a token valid for `ttl`.
///
/// Unknown usernames and wrong passwords both fail with
/// [`AuthError::InvalidCredential`] after one bcrypt verification.
pub async fn login(
    pool: &PgPool,
    username: &str,
    password: &str,
    ttl: Duration,
) -> Result<(User, AuthToken), AuthError> {
    let Some(record) = queries::find_user_by_username(pool, username).await? else {
        verify_unknown_account(password);
        return Err(AuthError::InvalidCredential);
    };

    if !verify_password(password, &record.password_hash) {
        return Err(AuthError::InvalidCredential);
    }

    let token = issue_with_retry(pool, record.user.id, ttl).await?;
    info!(user_id = record.user.id, "login succeeded");
    Ok((record.user, token))
}

/// Logout: revoke the presented token.
pub async fn logout(pool: &PgPool, token: &str) -> Result<(), AuthError> {
    revoke_token(pool, token).await
}

async fn issue_with_retry(
    pool: &PgPool,
    user_id: i32,
    ttl: Duration,
) -> Result<AuthToken, AuthError> {
    let mut attempt = 1;
    loop {
        match issue_token(pool, user_id, ttl).await {
            Err(AuthError::TokenCollision) if attempt < MAX_ISSUE_ATTEMPTS => {
                warn!(user_id, attempt, "token collision, retrying issuance");
                attempt += 1;
            }
            other => return other,
        }
    }
}
