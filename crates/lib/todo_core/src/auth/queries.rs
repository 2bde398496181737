//! Credential store: user queries.

use sqlx::PgPool;
use tracing::info;

use super::{AuthError, is_unique_violation};
use crate::models::auth::{User, UserWithPassword};

/// Create a new user.
///
/// Uniqueness is enforced by the `users.username` constraint; a violation is
/// reported as [`AuthError::DuplicateUsername`] and nothing is written.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, (i32, String)>(
        "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id, username",
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::DuplicateUsername
        } else {
            AuthError::Storage(e)
        }
    })?;

    info!(user_id = row.0, username = %row.1, "user created");
    Ok(User {
        id: row.0,
        username: row.1,
    })
}

/// Fetch a user and password hash by username.
pub async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, (i32, String, String)>(
        "SELECT id, username, password_hash FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, username, password_hash)| UserWithPassword {
        user: User { id, username },
        password_hash,
    }))
}

/// Fetch a user by ID.
pub async fn find_user_by_id(pool: &PgPool, user_id: i32) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (i32, String)>("SELECT id, username FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id, username)| User { id, username }))
}

/// Delete a user. Todos and tokens go with it (`ON DELETE CASCADE`).
///
/// Returns whether a user was deleted.
pub async fn delete_user(pool: &PgPool, user_id: i32) -> Result<bool, AuthError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count total users.
pub async fn user_count(pool: &PgPool) -> Result<i64, AuthError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
