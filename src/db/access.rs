//! Resilient data access facade.
//!
//! # Data Flow
//! ```text
//! TodoRepository
//!     → ResilientDataAccess::execute(kind, op)
//!     → CircuitBreaker::call            (fail fast while open)
//!     → RetryExecutor::run              (request budget, backoff between attempts)
//!     → ConnectionManager::select(kind) (replica or primary, chosen per attempt)
//!     → op(connection)
//! ```
//!
//! # Design Decisions
//! - The breaker wraps the retry loop, so an exhausted retry loop is one failure
//!   sample and a single degraded call cannot trip the breaker by itself
//! - An open breaker is returned as-is; the facade never retries it

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::db::connection::ConnectionManager;
use crate::resilience::{BreakerError, CircuitBreaker, RetryError, RetryExecutor};
use crate::store::{SharedStore, StoreError};

/// Logical database operations, used for routing, logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    ListTodos,
    CreateTodo,
    UpdateTodo,
    DeleteTodo,
}

impl OperationKind {
    pub fn is_read(&self) -> bool {
        matches!(self, OperationKind::ListTodos)
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::ListTodos => "list_todos",
            OperationKind::CreateTodo => "create_todo",
            OperationKind::UpdateTodo => "update_todo",
            OperationKind::DeleteTodo => "delete_todo",
        }
    }
}

/// Failure of a facade call.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Rejected by the circuit breaker; the operation never ran.
    #[error("circuit breaker is open")]
    BreakerOpen,

    /// The operation failed after the retry budget was spent.
    #[error("{source}")]
    Store {
        kind: OperationKind,
        #[source]
        source: StoreError,
    },
}

impl AccessError {
    pub fn is_breaker_open(&self) -> bool {
        matches!(self, AccessError::BreakerOpen)
    }
}

/// Single entry point for request-serving database work.
#[derive(Debug, Clone)]
pub struct ResilientDataAccess {
    breaker: CircuitBreaker,
    retry: RetryExecutor,
    connections: Arc<ConnectionManager>,
}

impl ResilientDataAccess {
    pub fn new(breaker: CircuitBreaker, retry: RetryExecutor, connections: Arc<ConnectionManager>) -> Self {
        Self {
            breaker,
            retry,
            connections,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Run `op` against the connection selected for `kind`, under the
    /// request retry budget, inside the shared circuit breaker.
    ///
    /// `op` is invoked once per attempt with a freshly selected connection.
    pub async fn execute<T, F, Fut>(&self, kind: OperationKind, mut op: F) -> Result<T, AccessError>
    where
        F: FnMut(SharedStore) -> Fut,
        Fut: Future<Output = Result<T, RetryError<StoreError>>>,
    {
        let connections = &self.connections;
        let retry = &self.retry;

        let outcome = self
            .breaker
            .call(move || retry.run(kind.label(), move || op(connections.select(kind))))
            .await;

        match outcome {
            Ok(value) => Ok(value),
            Err(BreakerError::Open) => {
                tracing::warn!(
                    operation = kind.label(),
                    breaker = self.breaker.name(),
                    "Database call rejected by open circuit breaker"
                );
                Err(AccessError::BreakerOpen)
            }
            Err(BreakerError::Inner(source)) => Err(AccessError::Store { kind, source }),
        }
    }
}
