//! Todo database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::{TodoError, validate_task};
use crate::models::todo::{Todo, TodoFilter, TodoPatch};

type TodoRow = (i32, i32, String, bool, DateTime<Utc>);

const TODO_COLUMNS: &str = "id, user_id, task, is_completed, created_at";

fn todo_from_row((id, user_id, task, is_completed, created_at): TodoRow) -> Todo {
    Todo {
        id,
        user_id,
        task,
        is_completed,
        created_at,
    }
}

/// List a user's todos ordered by id.
pub async fn list_todos(
    pool: &PgPool,
    user_id: i32,
    filter: TodoFilter,
) -> Result<Vec<Todo>, TodoError> {
    let sql = format!(
        "SELECT {TODO_COLUMNS} FROM todos \
         WHERE user_id = $1 AND ($2 = FALSE OR is_completed) \
         ORDER BY id"
    );
    let rows = sqlx::query_as::<_, TodoRow>(&sql)
        .bind(user_id)
        .bind(filter == TodoFilter::Completed)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(todo_from_row).collect())
}

/// Fetch one of a user's todos.
pub async fn get_todo(pool: &PgPool, user_id: i32, todo_id: i32) -> Result<Todo, TodoError> {
    let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, TodoRow>(&sql)
        .bind(todo_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(todo_from_row)
        .ok_or(TodoError::NotFound)
}

/// Create a todo for a user. New todos start incomplete.
pub async fn create_todo(pool: &PgPool, user_id: i32, task: &str) -> Result<Todo, TodoError> {
    validate_task(task)?;
    let sql = format!(
        "INSERT INTO todos (user_id, task, is_completed) VALUES ($1, $2, FALSE) \
         RETURNING {TODO_COLUMNS}"
    );
    let row = sqlx::query_as::<_, TodoRow>(&sql)
        .bind(user_id)
        .bind(task)
        .fetch_one(pool)
        .await?;
    debug!(user_id, todo_id = row.0, "todo created");
    Ok(todo_from_row(row))
}

/// Apply a partial update to one of a user's todos.
pub async fn update_todo(
    pool: &PgPool,
    user_id: i32,
    todo_id: i32,
    patch: &TodoPatch,
) -> Result<Todo, TodoError> {
    if let Some(task) = &patch.task {
        validate_task(task)?;
    }
    let sql = format!(
        "UPDATE todos \
         SET task = COALESCE($3, task), is_completed = COALESCE($4, is_completed) \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {TODO_COLUMNS}"
    );
    sqlx::query_as::<_, TodoRow>(&sql)
        .bind(todo_id)
        .bind(user_id)
        .bind(patch.task.as_deref())
        .bind(patch.is_completed)
        .fetch_optional(pool)
        .await?
        .map(todo_from_row)
        .ok_or(TodoError::NotFound)
}

/// Flip the completion flag of one of a user's todos in a single statement.
pub async fn toggle_todo(pool: &PgPool, user_id: i32, todo_id: i32) -> Result<Todo, TodoError> {
    let sql = format!(
        "UPDATE todos SET is_completed = NOT is_completed \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {TODO_COLUMNS}"
    );
    sqlx::query_as::<_, TodoRow>(&sql)
        .bind(todo_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(todo_from_row)
        .ok_or(TodoError::NotFound)
}

/// Delete one of a user's todos.
pub async fn delete_todo(pool: &PgPool, user_id: i32, todo_id: i32) -> Result<(), TodoError> {
    let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
        .bind(todo_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(TodoError::NotFound);
    }
    debug!(user_id, todo_id, "todo deleted");
    Ok(())
}
