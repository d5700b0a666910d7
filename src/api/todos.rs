//! Todo API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::auth::Session;
use crate::db::check_expected_version;
use crate::errors::{AppError, AppResult};
use crate::models::{CreateTodoRequest, Stored, Todo, UpdateTodoRequest};
use crate::AppState;

/// Load one of the caller's todos. Other users' todos look missing.
async fn own_todo(state: &AppState, session: &Session, id: &str) -> AppResult<Stored<Todo>> {
    match state.store.get::<Todo>(id).await? {
        Some(todo) if todo.doc.owner_id == session.user_id => Ok(todo),
        _ => Err(AppError::not_found("Todo", id)),
    }
}

/// GET /api/todos - List the caller's todos.
pub async fn list_todos(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Vec<Stored<Todo>>> {
    success(
        state
            .store
            .query_by_field::<Todo>("ownerId", &session.user_id)
            .await?,
    )
}

/// POST /api/todos - Create a todo.
pub async fn create_todo(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateTodoRequest>,
) -> ApiResult<Stored<Todo>> {
    let todo = request.into_todo(session.user_id)?;
    success(state.store.add(todo).await?)
}

/// PUT /api/todos/:id - Update a todo.
pub async fn update_todo(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<UpdateTodoRequest>,
) -> ApiResult<Stored<Todo>> {
    let mut todo = own_todo(&state, &session, &id).await?;
    check_expected_version(&todo, request.expected_version)?;

    request.apply(&mut todo.doc)?;
    success(state.store.save(todo).await?)
}

/// POST /api/todos/:id/toggle - Flip the completion flag.
pub async fn toggle_todo(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Stored<Todo>> {
    let mut todo = own_todo(&state, &session, &id).await?;
    todo.doc.completed = !todo.doc.completed;
    success(state.store.save(todo).await?)
}

/// DELETE /api/todos/:id - Delete a todo.
pub async fn delete_todo(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let todo = own_todo(&state, &session, &id).await?;
    state.store.delete::<Todo>(&todo.id).await?;
    success(())
}
