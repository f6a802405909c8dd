//! Database access layer.
//!
//! # Data Flow
//! ```text
//! Startup:  ConnectionConfig → connection.rs (primary fatal, replica degradable)
//! Requests: repository → access.rs (breaker → retry → selected connection)
//! ```

pub mod access;
pub mod connection;

pub use access::{AccessError, OperationKind, ResilientDataAccess};
pub use connection::{ConnectError, ConnectionConfig, ConnectionManager, ReadTarget};
