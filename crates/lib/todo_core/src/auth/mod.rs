//! Authentication and authorization logic.
//!
//! Provides password hashing, the credential store, bearer-token issuance
//! and validation, and the access gate shared by `todo_api` and `todo_cli`.

pub mod gate;
pub mod password;
pub mod queries;
pub mod session;
pub mod tokens;
pub mod validation;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists")]
    DuplicateUsername,

    /// Unknown username, wrong password, or unknown token. Never says which.
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Token expired")]
    Expired,

    #[error("Token collision")]
    TokenCollision,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Returns true when `e` is a unique-constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
