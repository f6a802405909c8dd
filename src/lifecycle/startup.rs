//! Startup orchestration.
//!
//! # Responsibilities
//! - Fetch the database password
//! - Establish connections (primary fatal, replica degradable)
//! - Build the breaker, retry executor, facade, repository and probe
//!
//! # Design Decisions
//! - Fail fast: any error returned here is fatal to the process
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound by the caller, after this returns

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ServiceConfig, StoreBackend};
use crate::db::{ConnectError, ConnectionConfig, ConnectionManager, ResilientDataAccess};
use crate::health::{HealthMonitor, HealthProbe};
use crate::http::AppState;
use crate::resilience::{BreakerSettings, CircuitBreaker, RetryExecutor, RetryPolicy};
use crate::secrets::{self, SecretError, SecretProvider};
use crate::store::{Connector, MemoryConnector, PgConnector};
use crate::todos::TodoRepository;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to fetch database password: {0}")]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the binary needs to start serving.
pub struct Service {
    pub state: AppState,
    pub connections: Arc<ConnectionManager>,
    pub monitor: HealthMonitor,
}

/// Connector for the configured backend.
pub fn connector_for(backend: StoreBackend) -> Box<dyn Connector> {
    match backend {
        StoreBackend::Postgres => Box::new(PgConnector),
        StoreBackend::Memory => Box::new(MemoryConnector::new()),
    }
}

/// Start the metrics exporter when enabled.
pub fn start_metrics(config: &ServiceConfig) -> Result<(), StartupError> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }
    let address = &config.observability.metrics_address;
    let addr: SocketAddr = address
        .parse()
        .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
    crate::observability::metrics::init_metrics(addr)?;
    Ok(())
}

/// Build the service from config using the configured secret provider and backend.
pub async fn bootstrap(config: &ServiceConfig) -> Result<Service, StartupError> {
    let provider = secrets::provider_from_config(&config.secrets);
    let connector = connector_for(config.database.backend);
    bootstrap_with(config, provider.as_ref(), connector.as_ref()).await
}

/// Build the service with explicit collaborators.
pub async fn bootstrap_with(
    config: &ServiceConfig,
    secret_provider: &dyn SecretProvider,
    connector: &dyn Connector,
) -> Result<Service, StartupError> {
    let password = secrets::database_password(&config.secrets, secret_provider).await?;

    let startup_retry = RetryExecutor::new(RetryPolicy::from(&config.retries.startup));
    let connection_config = ConnectionConfig::from_config(&config.database, password);
    let connections = Arc::new(ConnectionManager::connect(&connection_config, connector, &startup_retry).await?);

    let breaker = CircuitBreaker::new(BreakerSettings::from(&config.breaker));
    let request_retry = RetryExecutor::new(RetryPolicy::from(&config.retries.request));
    let access = ResilientDataAccess::new(breaker, request_retry, connections.clone());

    let probe = HealthProbe::new(connections.clone(), Duration::from_secs(config.health.timeout_secs));
    let monitor = HealthMonitor::new(probe.clone(), config.health.clone());

    tracing::info!(
        read_target = ?connections.read_target(),
        breaker = %config.breaker.name,
        "Data access layer ready"
    );

    Ok(Service {
        state: AppState {
            todos: TodoRepository::new(access),
            probe,
        },
        connections,
        monitor,
    })
}
