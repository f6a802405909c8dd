//! Todo resource.

pub mod model;
pub mod repository;

pub use model::{parse_id, NewTodo, Todo, TodoUpdate, ValidationError};
pub use repository::TodoRepository;
