//! Route handlers.
//!
//! Bodies arrive as raw bytes and are validated here, so malformed input
//! is answered with 400 before any database work.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::todos::{parse_id, NewTodo, TodoUpdate};

/// `GET /todos`
pub async fn list_todos(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let todos = state.todos.list().await?;
    Ok(Json(todos))
}

/// `POST /todos`
pub async fn create_todo(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let new = NewTodo::from_json(&body)?;
    let todo = state.todos.create(new).await?;
    tracing::debug!(id = todo.id, "Todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

/// `PUT /todos/{id}`
pub async fn update_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let update = TodoUpdate::from_json(&body)?;
    state.todos.set_completed(id, update.completed).await?;
    Ok(StatusCode::OK)
}

/// `DELETE /todos/{id}`
pub async fn delete_todo(State(state): State<AppState>, Path(raw_id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    state.todos.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.probe.check().await?;
    Ok("OK")
}
