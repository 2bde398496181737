//! Bearer token issuance and validation.
//!
//! Tokens are 256-bit random values, URL-safe base64 encoded. Only the
//! SHA-256 digest is stored, so a leaked table does not leak live sessions.
//!
//! A token is active while `now < expires_at`. Validation of an expired
//! token deletes it; revocation deletes it unconditionally. There is no
//! renewal.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::{RngCore, rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{debug, info};

use super::{AuthError, is_unique_violation};
use crate::models::auth::{AuthToken, User};

/// Default token lifetime: 60 minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Random bytes per token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Default token lifetime as a `Duration`.
pub fn default_ttl() -> Duration {
    Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES)
}

/// Lifetime of `minutes`, which must lie in `1..=MAX_TOKEN_TTL_MINUTES`.
pub fn ttl_from_minutes(minutes: i64) -> Result<Duration, AuthError> {
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        return Err(AuthError::Validation(format!(
            "Token lifetime must be between 1 and {MAX_TOKEN_TTL_MINUTES} minutes"
        )));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| AuthError::Internal(format!("token lifetime {minutes}m out of range")))
}

/// Generate a random, URL-safe token value.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash a token for storage.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue a new token for `user_id`, valid for `ttl` from now.
pub async fn issue_token(
    pool: &PgPool,
    user_id: i32,
    ttl: Duration,
) -> Result<AuthToken, AuthError> {
    issue_token_at(pool, user_id, ttl, Utc::now()).await
}

/// Issue a new token as of `now`.
///
/// A digest collision surfaces as [`AuthError::TokenCollision`]; callers
/// retry issuance. A negative `ttl`, or one whose expiry is not
/// representable, is [`AuthError::Validation`].
pub async fn issue_token_at(
    pool: &PgPool,
    user_id: i32,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<AuthToken, AuthError> {
    // The store keeps microseconds; truncate so the returned record matches it.
    let created_at = now.trunc_subsecs(6);
    if ttl < Duration::zero() {
        return Err(AuthError::Validation("Token lifetime cannot be negative".into()));
    }
    let expires_at = created_at
        .checked_add_signed(ttl)
        .ok_or_else(|| AuthError::Validation("Token lifetime out of range".into()))?;
    let token = generate_token();

    sqlx::query(
        "INSERT INTO auth_tokens (user_id, token_hash, created_at, expires_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(created_at)
    .bind(expires_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::TokenCollision
        } else {
            AuthError::Storage(e)
        }
    })?;

    debug!(user_id, %expires_at, "token issued");
    Ok(AuthToken {
        user_id,
        token,
        created_at,
        expires_at,
    })
}

/// Resolve a token to its user.
pub async fn validate_token(pool: &PgPool, token: &str) -> Result<User, AuthError> {
    validate_token_at(pool, token, Utc::now()).await
}

/// Resolve a token to its user as of `now`.
///
/// Lookup, expiry check and deletion of an expired token run in one
/// transaction holding a row lock, so a concurrent validate or revoke of the
/// same token cannot interleave.
pub async fn validate_token_at(
    pool: &PgPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let token_hash = hash_token(token);
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, (i32, String, DateTime<Utc>)>(
        "SELECT u.id, u.username, t.expires_at \
         FROM auth_tokens t \
         JOIN users u ON u.id = t.user_id \
         WHERE t.token_hash = $1 \
         FOR UPDATE OF t",
    )
    .bind(&token_hash)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((user_id, username, expires_at)) = row else {
        return Err(AuthError::InvalidCredential);
    };

    if now >= expires_at {
        sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        debug!(user_id, "expired token removed");
        return Err(AuthError::Expired);
    }

    tx.commit().await?;
    Ok(User {
        id: user_id,
        username,
    })
}

/// Revoke a token. Revoking an unknown token is not an error.
pub async fn revoke_token(pool: &PgPool, token: &str) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete every expired token. Returns the number removed.
pub async fn purge_expired_tokens(pool: &PgPool) -> Result<u64, AuthError> {
    let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    let removed = result.rows_affected();
    if removed > 0 {
        info!(removed, "purged expired tokens");
    }
    Ok(removed)
}

/// Count tokens belonging to a user, expired or not.
pub async fn token_count(pool: &PgPool, user_id: i32) -> Result<i64, AuthError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_url_safe_and_256_bits() {
        let token = generate_token();
        // 32 bytes, unpadded base64
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap().len(), TOKEN_BYTES);
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn hash_is_hex_sha256() {
        let h = hash_token("abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn default_ttl_is_one_hour() {
        assert_eq!(default_ttl(), Duration::hours(1));
    }

    #[test]
    fn ttl_minutes_are_bounded() {
        assert_eq!(ttl_from_minutes(15).unwrap(), Duration::minutes(15));
        assert_eq!(
            ttl_from_minutes(MAX_TOKEN_TTL_MINUTES).unwrap(),
            Duration::days(365)
        );
        for bad in [0, -1, MAX_TOKEN_TTL_MINUTES + 1, 200_000_000_000_000, i64::MAX] {
            assert!(
                matches!(ttl_from_minutes(bad), Err(AuthError::Validation(_))),
                "{bad} accepted"
            );
        }
    }
}
