//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the todo and health routes
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Serve on a listener until the shutdown broadcast fires

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::health::HealthProbe;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics;
use crate::todos::TodoRepository;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub todos: TodoRepository,
    pub probe: HealthProbe,
}

/// HTTP server for the todo API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: &ServiceConfig) -> Self {
        Self {
            router: Self::build_router(state, config),
        }
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[allow(deprecated)]
    fn build_router(state: AppState, config: &ServiceConfig) -> Router {
        Router::new()
            .route("/todos", get(handlers::list_todos).post(handlers::create_todo))
            .route("/todos/{id}", put(handlers::update_todo).delete(handlers::delete_todo))
            .route("/healthz", get(handlers::healthz))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
                    .layer(propagate_request_id_layer())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
