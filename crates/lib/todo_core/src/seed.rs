//! Reset the database to a known state with one user and sample todos.

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::auth::AuthError;
use crate::auth::password::hash_password;
use crate::auth::validation::{validate_password, validate_username};
use crate::models::auth::User;

/// Sample tasks created for the seeded user: (task, completed).
pub const SAMPLE_TODOS: [(&str, bool); 3] = [
    ("Buy groceries", false),
    ("Finish project", true),
    ("Call mom", false),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

/// Outcome of a reset.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub user: User,
    pub todos_created: usize,
}

/// Delete all users, tokens and todos, then create `username` with the
/// sample todos. Runs in one transaction.
pub async fn reset_and_seed(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<SeedReport, SeedError> {
    validate_username(username)?;
    validate_password(password)?;
    let pw_hash = hash_password(password)?;

    let mut tx = pool.begin().await?;

    sqlx::query("TRUNCATE todos, auth_tokens, users RESTART IDENTITY")
        .execute(&mut *tx)
        .await?;

    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id",
    )
    .bind(username)
    .bind(&pw_hash)
    .fetch_one(&mut *tx)
    .await?;

    for (task, completed) in SAMPLE_TODOS {
        sqlx::query("INSERT INTO todos (user_id, task, is_completed) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(task)
            .bind(completed)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(user_id, username, "database reset and seeded");

    Ok(SeedReport {
        user: User {
            id: user_id,
            username: username.to_string(),
        },
        todos_created: SAMPLE_TODOS.len(),
    })
}
