//! Storage backends.
//!
//! # Data Flow
//! ```text
//! db::connection (ConnectionManager)
//!     → Connector::connect(Endpoint)   (establish + verify one pool)
//!     → SharedStore                    (one logical connection, many callers)
//!     → TodoStore methods              (one statement each)
//! ```
//!
//! # Design Decisions
//! - A store is a pooled handle: cheap to share, safe for concurrent use
//! - Stores know nothing about retries or breakers; callers add resilience
//! - Backends: postgres.rs (sqlx) for deployments, memory.rs for local runs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::todos::model::Todo;

pub use memory::{MemoryConnector, MemoryStore};
pub use postgres::{PgConnector, PgStore};

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// One logical database connection (a pool behind a single handle).
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Round-trip to the database without touching data.
    async fn ping(&self) -> Result<(), StoreError>;

    /// All todos ordered by id.
    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError>;

    /// Insert a new, not yet completed todo and return it with its assigned id.
    async fn insert_todo(&self, task: &str) -> Result<Todo, StoreError>;

    /// Set the completion flag. Unknown ids are not an error.
    async fn set_completed(&self, id: i64, completed: bool) -> Result<(), StoreError>;

    /// Remove a todo. Unknown ids are not an error.
    async fn delete_todo(&self, id: i64) -> Result<(), StoreError>;

    /// Release pooled connections.
    async fn close(&self) {}
}

pub type SharedStore = Arc<dyn TodoStore>;

/// Establishes a store for an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open and verify (ping) a connection pool.
    async fn connect(&self, endpoint: &Endpoint) -> Result<SharedStore, StoreError>;
}

/// Logical role of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Replica,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Replica => "replica",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to reach one database server.
#[derive(Clone)]
pub struct Endpoint {
    pub role: Role,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
    pub password: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub ssl_mode: String,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "postgres://{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("role", &self.role)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}
