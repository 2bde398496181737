//! Authentication service: register/login/logout flows delegating to
//! `todo_core::auth::session` and shaping the HTTP responses.

use chrono::Duration;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{LoginResponse, LogoutResponse, UserResponse};

/// Register a new user account.
pub async fn register(pool: &PgPool, username: &str, password: &str) -> AppResult<UserResponse> {
    let user = todo_core::auth::session::register(pool, username, password).await?;
    Ok(user.into())
}

/// Authenticate with username + password and issue a bearer token.
pub async fn login(
    pool: &PgPool,
    username: &str,
    password: &str,
    token_ttl: Duration,
) -> AppResult<LoginResponse> {
    let (user, token) =
        todo_core::auth::session::login(pool, username, password, token_ttl).await?;
    Ok(LoginResponse::new(user, token))
}

/// Logout: revoke the presented token.
pub async fn logout(pool: &PgPool, token: &str) -> AppResult<LogoutResponse> {
    todo_core::auth::session::logout(pool, token).await?;
    Ok(LogoutResponse { success: true })
}
