//! Shared utilities for integration and load testing.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use todo_service::config::{RetryConfig, ServiceConfig, StoreBackend};
use todo_service::lifecycle::{bootstrap_with, Service, StartupError};
use todo_service::secrets::EnvSecretProvider;
use todo_service::store::{Connector, Endpoint, MemoryStore, Role, SharedStore, StoreError, TodoStore};
use todo_service::todos::Todo;
use todo_service::HttpServer;

/// In-memory store whose every call can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    /// Calls received so far, including failed ones.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TodoStore for FlakyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.ping().await
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError> {
        self.enter()?;
        self.inner.list_todos().await
    }

    async fn insert_todo(&self, task: &str) -> Result<Todo, StoreError> {
        self.enter()?;
        self.inner.insert_todo(task).await
    }

    async fn set_completed(&self, id: i64, completed: bool) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.set_completed(id, completed).await
    }

    async fn delete_todo(&self, id: i64) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.delete_todo(id).await
    }
}

/// Hands out a fixed store per role, refusing connections to unreachable roles.
pub struct FlakyConnector {
    pub primary: Arc<FlakyStore>,
    pub replica: Arc<FlakyStore>,
    unreachable: Vec<Role>,
}

#[allow(dead_code)]
impl FlakyConnector {
    pub fn new() -> Self {
        Self {
            primary: FlakyStore::new(),
            replica: FlakyStore::new(),
            unreachable: Vec::new(),
        }
    }

    pub fn unreachable(mut self, role: Role) -> Self {
        self.unreachable.push(role);
        self
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<SharedStore, StoreError> {
        if self.unreachable.contains(&endpoint.role) {
            return Err(StoreError::Unavailable(format!("{} is unreachable", endpoint.host)));
        }
        let store: SharedStore = match endpoint.role {
            Role::Primary => self.primary.clone(),
            Role::Replica => self.replica.clone(),
        };
        Ok(store)
    }
}

/// Memory-backed config with short startup retries and no background probe.
#[allow(dead_code)]
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.database.backend = StoreBackend::Memory;
    config.health.enabled = false;
    config.retries.startup = RetryConfig {
        initial_interval_ms: 10,
        max_interval_ms: 100,
        max_elapsed_ms: 500,
        multiplier: 1.5,
        randomization_factor: 0.0,
    };
    config
}

#[allow(dead_code)]
pub fn with_replica(mut config: ServiceConfig) -> ServiceConfig {
    config.database.read_host = Some("replica.internal".into());
    config
}

#[allow(dead_code)]
pub async fn start(config: &ServiceConfig, connector: &dyn Connector) -> Result<Service, StartupError> {
    bootstrap_with(config, &EnvSecretProvider, connector).await
}

#[allow(dead_code)]
pub fn router(service: &Service, config: &ServiceConfig) -> Router {
    HttpServer::new(service.state.clone(), config).router()
}

/// Drive one request through the router.
#[allow(dead_code)]
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
