//! Non-interactive maintenance commands.

use std::io::Write;

use sqlx::PgPool;
use todo_core::auth::{queries, tokens};
use todo_core::models::todo::TodoFilter;
use todo_core::seed::reset_and_seed;
use todo_core::{diagnose as checks, todos};

use crate::Result;

/// Reset the database and create one user with sample todos.
pub async fn seed(
    pool: &PgPool,
    username: &str,
    password: &str,
    out: &mut impl Write,
) -> Result<()> {
    let report = reset_and_seed(pool, username, password).await?;
    writeln!(out, "Database reset successfully.")?;
    writeln!(out, "Created user '{}' (id {})", report.user.username, report.user.id)?;
    writeln!(out, "Added {} sample tasks.", report.todos_created)?;
    Ok(())
}

/// Print diagnostic results. Returns whether every check passed.
pub async fn diagnose(pool: &PgPool, out: &mut impl Write) -> Result<bool> {
    let results = checks::run(pool).await;
    for check in &results {
        let tag = if check.ok { "[OK]" } else { "[FAIL]" };
        writeln!(out, "{tag} {}: {}", check.name, check.detail)?;
    }
    Ok(checks::all_ok(&results))
}

/// Report whether `username` exists and list its todos.
pub async fn inspect(pool: &PgPool, username: &str, out: &mut impl Write) -> Result<bool> {
    let Some(record) = queries::find_user_by_username(pool, username).await? else {
        writeln!(out, "User '{username}' not found")?;
        return Ok(false);
    };

    let items = todos::list_todos(pool, record.user.id, TodoFilter::All).await?;
    writeln!(
        out,
        "Found user '{}' (id {}) with {} tasks:",
        record.user.username,
        record.user.id,
        items.len()
    )?;
    for todo in &items {
        let mark = if todo.is_completed { 'x' } else { ' ' };
        writeln!(out, "- {} [{mark}]", todo.task)?;
    }
    Ok(true)
}

/// Delete expired tokens once.
pub async fn purge_tokens(pool: &PgPool, out: &mut impl Write) -> Result<()> {
    let removed = tokens::purge_expired_tokens(pool).await?;
    writeln!(out, "Removed {removed} expired tokens.")?;
    Ok(())
}
