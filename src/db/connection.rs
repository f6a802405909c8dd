//! Primary / read-replica connection topology.
//!
//! # Responsibilities
//! - Establish the primary with the startup retry budget (fatal on exhaustion)
//! - Establish the optional replica with the same budget (degradable)
//! - Pick the connection for an operation: writes → primary, reads → read target
//!
//! # Design Decisions
//! - A failed replica is never aliased into a second handle; `ReadTarget`
//!   records where reads go and the primary handle is reused
//! - Connections are pooled and long-lived; nothing here reconnects per call

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::db::access::OperationKind;
use crate::resilience::{RetryError, RetryExecutor};
use crate::store::{Connector, Endpoint, Role, SharedStore, StoreError};

/// Where read operations are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Primary,
    Replica,
}

/// Raised when the primary cannot be reached within the startup budget.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to primary database {endpoint}: {source}")]
    PrimaryUnavailable {
        endpoint: String,
        #[source]
        source: StoreError,
    },
}

/// Connection parameters for the primary and optional replica.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub user: String,
    pub database: String,
    pub primary_host: String,
    pub primary_port: u16,
    pub replica_host: Option<String>,
    /// Falls back to `primary_port` when unset.
    pub replica_port: Option<u16>,
    pub password: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub ssl_mode: String,
}

impl ConnectionConfig {
    pub fn from_config(config: &DatabaseConfig, password: Option<String>) -> Self {
        Self {
            user: config.user.clone(),
            database: config.name.clone(),
            primary_host: config.host.clone(),
            primary_port: config.port,
            replica_host: config.read_host.clone(),
            replica_port: config.read_port,
            password,
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
            ssl_mode: config.ssl_mode.clone(),
        }
    }

    pub fn primary_endpoint(&self) -> Endpoint {
        self.endpoint(Role::Primary, self.primary_host.clone(), self.primary_port)
    }

    pub fn replica_endpoint(&self) -> Option<Endpoint> {
        let host = self.replica_host.clone()?;
        let port = self.replica_port.unwrap_or(self.primary_port);
        Some(self.endpoint(Role::Replica, host, port))
    }

    fn endpoint(&self, role: Role, host: String, port: u16) -> Endpoint {
        Endpoint {
            role,
            host,
            port,
            user: self.user.clone(),
            database: self.database.clone(),
            password: self.password.clone(),
            max_connections: self.max_connections,
            acquire_timeout: self.acquire_timeout,
            ssl_mode: self.ssl_mode.clone(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("database", &self.database)
            .field("primary_host", &self.primary_host)
            .field("primary_port", &self.primary_port)
            .field("replica_host", &self.replica_host)
            .field("replica_port", &self.replica_port)
            .finish_non_exhaustive()
    }
}

/// Owns the primary and, when reachable, the replica connection.
pub struct ConnectionManager {
    primary: SharedStore,
    replica: Option<SharedStore>,
}

impl ConnectionManager {
    /// Establish connections. Only primary failure is an error.
    pub async fn connect(
        config: &ConnectionConfig,
        connector: &dyn Connector,
        retry: &RetryExecutor,
    ) -> Result<Self, ConnectError> {
        let primary_endpoint = config.primary_endpoint();
        tracing::info!(role = %Role::Primary, url = %primary_endpoint, "Connecting to database");

        let primary = match establish(connector, &primary_endpoint, retry).await {
            Ok(store) => store,
            Err(source) => {
                tracing::error!(
                    role = %Role::Primary,
                    url = %primary_endpoint,
                    error = %source,
                    "Could not connect to primary database"
                );
                return Err(ConnectError::PrimaryUnavailable {
                    endpoint: primary_endpoint.to_string(),
                    source,
                });
            }
        };
        tracing::info!(role = %Role::Primary, "Connected to database");

        let replica = match config.replica_endpoint() {
            None => {
                tracing::info!("No read replica configured, reads use the primary");
                None
            }
            Some(endpoint) => {
                tracing::info!(role = %Role::Replica, url = %endpoint, "Connecting to database");
                match establish(connector, &endpoint, retry).await {
                    Ok(store) => {
                        tracing::info!(role = %Role::Replica, "Connected to database");
                        Some(store)
                    }
                    Err(e) => {
                        tracing::warn!(
                            role = %Role::Replica,
                            url = %endpoint,
                            error = %e,
                            "Could not connect to read replica, falling back to primary for reads"
                        );
                        None
                    }
                }
            }
        };

        Ok(Self::from_parts(primary, replica))
    }

    /// Assemble from already established stores.
    pub fn from_parts(primary: SharedStore, replica: Option<SharedStore>) -> Self {
        Self { primary, replica }
    }

    pub fn read_target(&self) -> ReadTarget {
        match self.replica {
            Some(_) => ReadTarget::Replica,
            None => ReadTarget::Primary,
        }
    }

    pub fn select_for_read(&self) -> SharedStore {
        match (self.read_target(), &self.replica) {
            (ReadTarget::Replica, Some(replica)) => replica.clone(),
            _ => self.primary.clone(),
        }
    }

    pub fn select_for_write(&self) -> SharedStore {
        self.primary.clone()
    }

    pub fn select(&self, kind: OperationKind) -> SharedStore {
        if kind.is_read() {
            self.select_for_read()
        } else {
            self.select_for_write()
        }
    }

    pub fn primary(&self) -> &SharedStore {
        &self.primary
    }

    /// The replica, only when it is a connection distinct from the primary.
    pub fn replica(&self) -> Option<&SharedStore> {
        self.replica.as_ref()
    }

    pub async fn close(&self) {
        if let Some(replica) = &self.replica {
            replica.close().await;
        }
        self.primary.close().await;
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("read_target", &self.read_target())
            .finish()
    }
}

async fn establish(
    connector: &dyn Connector,
    endpoint: &Endpoint,
    retry: &RetryExecutor,
) -> Result<SharedStore, StoreError> {
    let operation = match endpoint.role {
        Role::Primary => "connect_primary",
        Role::Replica => "connect_replica",
    };
    retry
        .run(operation, move || async move {
            connector.connect(endpoint).await.map_err(RetryError::Transient)
        })
        .await
}
