//! In-process backend.
//!
//! Backs local runs and tests. Ids are assigned monotonically from 1 and
//! never reused, matching a `SERIAL` column.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::store::{Connector, Endpoint, SharedStore, StoreError, TodoStore};
use crate::todos::model::Todo;

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Todo>,
}

/// A todo table held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.table().rows.values().cloned().collect())
    }

    async fn insert_todo(&self, task: &str) -> Result<Todo, StoreError> {
        let mut table = self.table();
        table.last_id += 1;
        let todo = Todo {
            id: table.last_id,
            task: task.to_string(),
            completed: false,
        };
        table.rows.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn set_completed(&self, id: i64, completed: bool) -> Result<(), StoreError> {
        if let Some(todo) = self.table().rows.get_mut(&id) {
            todo.completed = completed;
        }
        Ok(())
    }

    async fn delete_todo(&self, id: i64) -> Result<(), StoreError> {
        self.table().rows.remove(&id);
        Ok(())
    }
}

/// Hands out one shared [`MemoryStore`] for every endpoint, so a configured
/// replica observes primary writes immediately.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<SharedStore, StoreError> {
        tracing::debug!(role = %endpoint.role, "Using in-memory store");
        let store: SharedStore = self.store.clone();
        Ok(store)
    }
}
