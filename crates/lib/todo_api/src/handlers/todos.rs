//! Todo request handlers.
//!
//! All handlers sit behind `require_auth` and scope storage access to the
//! authenticated user's id.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use todo_core::models::todo::{TodoFilter, TodoPatch};
use todo_core::todos;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateTodoRequest, DeleteResponse, ListTodosQuery, TodoResponse, UpdateTodoRequest,
};

/// `GET /todos`: list the caller's todos, optionally only completed ones.
pub async fn list_todos_handler(
    State(state): State<AppState>,
    axum::Extension(auth): axum::Extension<AuthenticatedUser>,
    Query(query): Query<ListTodosQuery>,
) -> AppResult<Json<Vec<TodoResponse>>> {
    let filter = match query.completed {
        Some(true) => TodoFilter::Completed,
        _ => TodoFilter::All,
    };
    let items = todos::list_todos(&state.pool, auth.user.id, filter).await?;
    Ok(Json(items.into_iter().map(TodoResponse::from).collect()))
}

/// `POST /todos`: create a todo.
pub async fn create_todo_handler(
    State(state): State<AppState>,
    axum::Extension(auth): axum::Extension<AuthenticatedUser>,
    Json(body): Json<CreateTodoRequest>,
) -> AppResult<(StatusCode, Json<TodoResponse>)> {
    let todo = todos::create_todo(&state.pool, auth.user.id, &body.task).await?;
    Ok((StatusCode::CREATED, Json(todo.into())))
}

/// `GET /todos/{id}`: fetch one todo.
pub async fn get_todo_handler(
    State(state): State<AppState>,
    axum::Extension(auth): axum::Extension<AuthenticatedUser>,
    Path(todo_id): Path<i32>,
) -> AppResult<Json<TodoResponse>> {
    let todo = todos::get_todo(&state.pool, auth.user.id, todo_id).await?;
    Ok(Json(todo.into()))
}

/// `PATCH /todos/{id}`: update task text and/or completion.
pub async fn update_todo_handler(
    State(state): State<AppState>,
    axum::Extension(auth): axum::Extension<AuthenticatedUser>,
    Path(todo_id): Path<i32>,
    Json(body): Json<UpdateTodoRequest>,
) -> AppResult<Json<TodoResponse>> {
    let patch = TodoPatch {
        task: body.task,
        is_completed: body.is_completed,
    };
    let todo = todos::update_todo(&state.pool, auth.user.id, todo_id, &patch).await?;
    Ok(Json(todo.into()))
}

/// `POST /todos/{id}/toggle`: flip completion.
pub async fn toggle_todo_handler(
    State(state): State<AppState>,
    axum::Extension(auth): axum::Extension<AuthenticatedUser>,
    Path(todo_id): Path<i32>,
) -> AppResult<Json<TodoResponse>> {
    let todo = todos::toggle_todo(&state.pool, auth.user.id, todo_id).await?;
    Ok(Json(todo.into()))
}

/// `DELETE /todos/{id}`: delete a todo.
pub async fn delete_todo_handler(
    State(state): State<AppState>,
    axum::Extension(auth): axum::Extension<AuthenticatedUser>,
    Path(todo_id): Path<i32>,
) -> AppResult<Json<DeleteResponse>> {
    todos::delete_todo(&state.pool, auth.user.id, todo_id).await?;
    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
    }))
}
