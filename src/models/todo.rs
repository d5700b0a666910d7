//! Dashboard todo model.

use serde::{Deserialize, Serialize};

use super::Document;
use crate::errors::AppResult;

/// A personal todo item on the user dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub owner_id: String,
}

impl Document for Todo {
    const COLLECTION: &'static str = "todos";
    const KIND: &'static str = "Todo";
}

/// Request body for creating a todo.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTodoRequest {
    pub fn into_todo(self, owner_id: String) -> AppResult<Todo> {
        Ok(Todo {
            title: super::required_text("Title", &self.title)?,
            description: self.description.unwrap_or_default(),
            completed: false,
            owner_id,
        })
    }
}

/// Request body for updating a todo.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl UpdateTodoRequest {
    pub fn apply(self, todo: &mut Todo) -> AppResult<()> {
        if let Some(title) = self.title {
            todo.title = super::required_text("Title", &title)?;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        Ok(())
    }
}
