//! Access gate: the single point that turns a presented credential into a
//! user.
//!
//! Every protected operation resolves its user here and scopes storage
//! access to the returned id. A caller can never name its own user id.

use sqlx::PgPool;

use super::AuthError;
use super::tokens::validate_token;
use crate::models::auth::User;

/// Resolve a presented bearer token to a user.
///
/// Missing or blank credentials are [`AuthError::InvalidCredential`].
pub async fn authenticate(pool: &PgPool, credential: Option<&str>) -> Result<User, AuthError> {
    let token = credential
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidCredential)?;
    validate_token(pool, token).await
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
