//! Todo storage scoped to an owning user.
//!
//! Every query filters by both todo id and owner id, so a todo that belongs
//! to someone else is indistinguishable from one that does not exist.

pub mod queries;

pub use queries::{create_todo, delete_todo, get_todo, list_todos, toggle_todo, update_todo};

use thiserror::Error;

/// Maximum task length in characters.
pub const TASK_MAX_CHARS: usize = 500;

/// Todo storage errors.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Todo not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Check task text is 1–500 characters and not only whitespace.
pub fn validate_task(task: &str) -> Result<(), TodoError> {
    if task.trim().is_empty() {
        return Err(TodoError::Validation("Task cannot be empty".into()));
    }
    if task.chars().count() > TASK_MAX_CHARS {
        return Err(TodoError::Validation(format!(
            "Task must be at most {TASK_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_tasks_are_rejected() {
        assert!(matches!(validate_task(""), Err(TodoError::Validation(_))));
        assert!(matches!(validate_task("   "), Err(TodoError::Validation(_))));
    }

    #[test]
    fn task_length_limit() {
        assert!(validate_task(&"x".repeat(TASK_MAX_CHARS)).is_ok());
        assert!(validate_task(&"x".repeat(TASK_MAX_CHARS + 1)).is_err());
        assert!(validate_task("buy milk").is_ok());
    }
}
