//! Metrics collection and exposition.
//!
//! # Metrics
//! - `todo_http_requests_total` (counter): requests by method, route, status
//! - `todo_http_request_duration_seconds` (histogram): latency by method, route
//! - `todo_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `todo_breaker_rejections_total` (counter): calls refused by an open breaker
//! - `todo_db_retries_total` (counter): retried database attempts by operation
//! - `todo_db_up` (gauge): 1=reachable, 0=unreachable, by role
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; with no recorder installed
//!   every call is a no-op, so library code and tests record unconditionally
//! - The Prometheus exporter serves its own listener, separate from the API

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;
use crate::store::Role;

/// Install the global Prometheus recorder and start its scrape endpoint.
///
/// Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let route = route.to_string();

    counter!(
        "todo_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "todo_http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_breaker_state(name: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("todo_breaker_state", "name" => name.to_string()).set(value);
}

pub fn record_breaker_rejection(name: &str) {
    counter!("todo_breaker_rejections_total", "name" => name.to_string()).increment(1);
}

pub fn record_retry(operation: &str) {
    counter!("todo_db_retries_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_db_health(role: Role, healthy: bool) {
    gauge!("todo_db_up", "role" => role.as_str()).set(if healthy { 1.0 } else { 0.0 });
}
