//! Todo CRUD operations over the resilient data access facade.

use crate::db::{AccessError, OperationKind, ResilientDataAccess};
use crate::resilience::RetryError;
use crate::todos::model::{NewTodo, Todo};

/// The four todo operations. Every call round-trips to the store.
#[derive(Debug, Clone)]
pub struct TodoRepository {
    access: ResilientDataAccess,
}

impl TodoRepository {
    pub fn new(access: ResilientDataAccess) -> Self {
        Self { access }
    }

    pub fn access(&self) -> &ResilientDataAccess {
        &self.access
    }

    /// All todos ordered by id, read from the read target.
    pub async fn list(&self) -> Result<Vec<Todo>, AccessError> {
        self.access
            .execute(OperationKind::ListTodos, |conn| async move {
                conn.list_todos().await.map_err(RetryError::Transient)
            })
            .await
    }

    /// Insert on the primary and return the stored row.
    pub async fn create(&self, new: NewTodo) -> Result<Todo, AccessError> {
        let task = new.task.as_str();
        self.access
            .execute(OperationKind::CreateTodo, move |conn| async move {
                conn.insert_todo(task).await.map_err(RetryError::Transient)
            })
            .await
    }

    pub async fn set_completed(&self, id: i64, completed: bool) -> Result<(), AccessError> {
        self.access
            .execute(OperationKind::UpdateTodo, move |conn| async move {
                conn.set_completed(id, completed).await.map_err(RetryError::Transient)
            })
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AccessError> {
        self.access
            .execute(OperationKind::DeleteTodo, move |conn| async move {
                conn.delete_todo(id).await.map_err(RetryError::Transient)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionManager;
    use crate::resilience::{BreakerSettings, CircuitBreaker, RetryExecutor, RetryPolicy};
    use crate::store::{MemoryStore, SharedStore};
    use std::sync::Arc;

    fn repository() -> TodoRepository {
        let store: SharedStore = Arc::new(MemoryStore::new());
        TodoRepository::new(ResilientDataAccess::new(
            CircuitBreaker::new(BreakerSettings::default()),
            RetryExecutor::new(RetryPolicy::request()),
            Arc::new(ConnectionManager::from_parts(store, None)),
        ))
    }

    #[tokio::test]
    async fn test_crud_through_facade() {
        let repo = repository();

        let created = repo.create(NewTodo { task: "buy milk".into() }).await.unwrap();
        assert_eq!(created, Todo { id: 1, task: "buy milk".into(), completed: false });

        repo.set_completed(created.id, true).await.unwrap();
        assert!(repo.list().await.unwrap()[0].completed);

        repo.delete(created.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_an_error() {
        let repo = repository();
        repo.set_completed(99, true).await.unwrap();
        repo.delete(99).await.unwrap();
    }
}
