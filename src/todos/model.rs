//! Todo resource types and request validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Server-assigned, monotonic.
    pub id: i64,
    pub task: String,
    #[serde(default)]
    pub completed: bool,
}

/// Caller input rejected before any database work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid request body: {0}")]
    Body(String),

    #[error("task must not be empty")]
    EmptyTask,

    #[error("invalid todo id '{0}'")]
    Id(String),
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTodo {
    pub task: String,
}

impl NewTodo {
    /// Parse and validate a JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let new: NewTodo = parse(body)?;
        if new.task.trim().is_empty() {
            return Err(ValidationError::EmptyTask);
        }
        Ok(new)
    }
}

/// Body of `PUT /todos/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TodoUpdate {
    pub completed: bool,
}

impl TodoUpdate {
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        parse(body)
    }
}

/// Parse a path segment as a todo id.
pub fn parse_id(raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ValidationError::Id(raw.to_string()))
}

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ValidationError> {
    serde_json::from_slice(body).map_err(|e| ValidationError::Body(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_json_shape() {
        let todo = Todo { id: 1, task: "buy milk".into(), completed: false };
        assert_eq!(
            serde_json::to_string(&todo).unwrap(),
            r#"{"id":1,"task":"buy milk","completed":false}"#
        );
    }

    #[test]
    fn test_new_todo_validation() {
        assert_eq!(
            NewTodo::from_json(br#"{"task":"buy milk"}"#).unwrap().task,
            "buy milk"
        );
        assert_eq!(NewTodo::from_json(br#"{"task":"   "}"#), Err(ValidationError::EmptyTask));
        assert!(matches!(NewTodo::from_json(br#"{}"#), Err(ValidationError::Body(_))));
        assert!(matches!(NewTodo::from_json(b"not json"), Err(ValidationError::Body(_))));
        assert!(matches!(NewTodo::from_json(br#"{"task":7}"#), Err(ValidationError::Body(_))));
    }

    #[test]
    fn test_update_validation() {
        assert_eq!(
            TodoUpdate::from_json(br#"{"completed":true}"#),
            Ok(TodoUpdate { completed: true })
        );
        assert!(TodoUpdate::from_json(br#"{"completed":"yes"}"#).is_err());
        assert!(TodoUpdate::from_json(b"").is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12"), Ok(12));
        assert_eq!(parse_id("abc"), Err(ValidationError::Id("abc".into())));
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
    }
}
