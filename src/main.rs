//! Todo service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum router, middleware)
//!                       │
//!                       ▼
//!                     todos::repository
//!                       │
//!                       ▼
//!                     db::access (ResilientDataAccess)
//!                       ├─ resilience::circuit_breaker   fail fast while open
//!                       ├─ resilience::retries           backoff within a budget
//!                       └─ db::connection                 primary / replica selection
//!                               │
//!                               ▼
//!                     store (Postgres pools or in-memory)
//!
//!     Cross-cutting: config, secrets, health, observability, lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use todo_service::config;
use todo_service::http::HttpServer;
use todo_service::lifecycle::{self, signals, startup, Shutdown, StartupError};
use todo_service::observability::logging;

#[derive(Parser)]
#[command(name = "todo-service", version, about = "Todo API with a resilient database layer")]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "TODO_SERVICE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load(args.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "todo-service starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.database.backend,
        db_host = %config.database.host,
        read_host = config.database.read_host.as_deref().unwrap_or("-"),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if let Err(e) = startup::start_metrics(&config) {
        tracing::error!(error = %e, "Startup failed");
        return Err(e.into());
    }

    let service = match lifecycle::bootstrap(&config).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(source) => {
            let e = StartupError::Bind {
                address: config.listener.bind_address.clone(),
                source,
            };
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    let monitor = tokio::spawn(service.monitor.run(shutdown.subscribe()));
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(service.state, &config);
    let served = server.run(listener, server_shutdown).await;

    if shutdown.trigger() {
        tracing::warn!("HTTP server stopped before a shutdown signal");
    }
    if let Err(e) = monitor.await {
        tracing::warn!(error = %e, "Health monitor task failed");
    }
    service.connections.close().await;

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
