//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the todo service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Primary and replica connection settings.
    pub database: DatabaseConfig,

    /// Where the database password comes from.
    pub secrets: SecretsConfig,

    /// Circuit breaker guarding database calls.
    pub breaker: BreakerConfig,

    /// Retry budgets for startup and request-serving calls.
    pub retries: RetriesConfig,

    /// Background health probing.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Timeout configuration for HTTP requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,

    pub user: String,

    /// Database name.
    pub name: String,

    /// Primary host; all writes go here.
    pub host: String,

    pub port: u16,

    /// Read replica host. When absent, reads use the primary.
    pub read_host: Option<String>,

    /// Read replica port. Defaults to `port`.
    pub read_port: Option<u16>,

    /// Maximum pooled connections per endpoint.
    pub max_connections: u32,

    /// How long to wait for a pooled connection, in seconds.
    pub acquire_timeout_secs: u64,

    /// Postgres sslmode (disable, prefer, require, ...).
    pub ssl_mode: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Postgres,
            user: "postgres".to_string(),
            name: "todos".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            read_host: None,
            read_port: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
            ssl_mode: "disable".to_string(),
        }
    }
}

/// Secret provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretSource {
    /// Read secrets from environment variables.
    Env,
    /// Read secrets from files in a mounted directory.
    File,
}

/// Secret retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub provider: SecretSource,

    /// Name of the database password secret. No password is sent when unset.
    pub password_name: Option<String>,

    /// Directory holding secret files for the `file` provider.
    pub dir: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            provider: SecretSource::Env,
            password_name: None,
            dir: "/var/run/secrets/todo".to_string(),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Name used in logs and metrics.
    pub name: String,

    /// Trial calls admitted while half-open.
    pub max_half_open_requests: u32,

    /// How long the breaker stays open before admitting a trial, in seconds.
    pub open_timeout_secs: u64,

    /// Minimum requests observed before the breaker may trip.
    pub min_requests: u32,

    /// Failure ratio at or above which the breaker trips.
    pub failure_ratio: f64,

    /// Cyclic reset period for closed-state counts in seconds (0 = never).
    pub interval_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: "DatabaseCB".to_string(),
            max_half_open_requests: 1,
            open_timeout_secs: 30,
            min_requests: 3,
            failure_ratio: 0.6,
            interval_secs: 0,
        }
    }
}

/// Retry budgets per call site.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetriesConfig {
    /// Used for every request-serving database call.
    pub request: RetryConfig,

    /// Used while establishing connections at startup.
    pub startup: RetryConfig,
}

impl Default for RetriesConfig {
    fn default() -> Self {
        Self {
            request: RetryConfig::request(),
            startup: RetryConfig::startup(),
        }
    }
}

/// Exponential backoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// First wait between attempts in milliseconds.
    pub initial_interval_ms: u64,

    /// Upper bound for a single wait in milliseconds.
    pub max_interval_ms: u64,

    /// Give up once this much time has passed since the first attempt.
    pub max_elapsed_ms: u64,

    /// Growth factor applied to the wait after every attempt.
    pub multiplier: f64,

    /// Jitter as a fraction of the wait (0 = none).
    #[serde(default)]
    pub randomization_factor: f64,
}

impl RetryConfig {
    pub fn request() -> Self {
        Self {
            initial_interval_ms: 100,
            max_interval_ms: 2_000,
            max_elapsed_ms: 5_000,
            multiplier: 1.5,
            randomization_factor: 0.0,
        }
    }

    pub fn startup() -> Self {
        Self {
            initial_interval_ms: 500,
            max_interval_ms: 60_000,
            max_elapsed_ms: 120_000,
            multiplier: 1.5,
            randomization_factor: 0.5,
        }
    }
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Enable the background health monitor.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Per-ping timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
