//! Todo domain models.

use serde::{Deserialize, Serialize};

/// A task owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i32,
    pub user_id: i32,
    pub task: String,
    pub is_completed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Partial update applied by `todos::update_todo`.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub task: Option<String>,
    pub is_completed: Option<bool>,
}

/// Which todos a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodoFilter {
    #[default]
    All,
    Completed,
}
