//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic, including unknown enum values)
//! - Validate value ranges (timeouts > 0, ports valid, ratios in range)
//! - Check cross-field constraints (initial interval <= max interval, request
//!   timeout > request retry budget)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{RetryConfig, ServiceConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic constraint and collect all violations.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let db = &config.database;
    for (field, value) in [("database.user", &db.user), ("database.name", &db.name), ("database.host", &db.host)] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }
    if db.port == 0 {
        errors.push(ValidationError::new("database.port", "must be non-zero"));
    }
    if db.read_port == Some(0) {
        errors.push(ValidationError::new("database.read_port", "must be non-zero"));
    }
    if db.read_port.is_some() && db.read_host.is_none() {
        errors.push(ValidationError::new("database.read_port", "set without database.read_host"));
    }
    if db.read_host.as_deref().is_some_and(|h| h.trim().is_empty()) {
        errors.push(ValidationError::new("database.read_host", "must not be empty when set"));
    }
    if db.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be greater than 0"));
    }
    if db.acquire_timeout_secs == 0 {
        errors.push(ValidationError::new("database.acquire_timeout_secs", "must be greater than 0"));
    }

    if config.secrets.password_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        errors.push(ValidationError::new("secrets.password_name", "must not be empty when set"));
    }

    let breaker = &config.breaker;
    if !(breaker.failure_ratio > 0.0 && breaker.failure_ratio <= 1.0) {
        errors.push(ValidationError::new("breaker.failure_ratio", "must be in (0, 1]"));
    }
    if breaker.max_half_open_requests == 0 {
        errors.push(ValidationError::new("breaker.max_half_open_requests", "must be at least 1"));
    }
    if breaker.open_timeout_secs == 0 {
        errors.push(ValidationError::new("breaker.open_timeout_secs", "must be greater than 0"));
    }

    validate_retry("retries.request", &config.retries.request, &mut errors);
    validate_retry("retries.startup", &config.retries.startup, &mut errors);

    // Request timeout must outlast the request retry budget.
    let request_timeout_ms = config.timeouts.request_secs.saturating_mul(1000);
    if config.timeouts.request_secs > 0 && request_timeout_ms <= config.retries.request.max_elapsed_ms {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must be longer than retries.request.max_elapsed_ms ({}ms)",
                config.retries.request.max_elapsed_ms
            ),
        ));
    }

    if config.health.enabled && config.health.interval_secs == 0 {
        errors.push(ValidationError::new("health.interval_secs", "must be greater than 0"));
    }
    if config.health.timeout_secs == 0 {
        errors.push(ValidationError::new("health.timeout_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_retry(section: &str, retry: &RetryConfig, errors: &mut Vec<ValidationError>) {
    if retry.initial_interval_ms == 0 {
        errors.push(ValidationError::new(format!("{section}.initial_interval_ms"), "must be greater than 0"));
    }
    if retry.initial_interval_ms > retry.max_interval_ms {
        errors.push(ValidationError::new(
            format!("{section}.max_interval_ms"),
            "must not be less than initial_interval_ms",
        ));
    }
    if retry.max_elapsed_ms == 0 {
        errors.push(ValidationError::new(format!("{section}.max_elapsed_ms"), "must be greater than 0"));
    }
    if retry.multiplier < 1.0 {
        errors.push(ValidationError::new(format!("{section}.multiplier"), "must be at least 1.0"));
    }
    if !(0.0..1.0).contains(&retry.randomization_factor) {
        errors.push(ValidationError::new(
            format!("{section}.randomization_factor"),
            "must be in [0, 1)",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.database.user = "".into();
        config.breaker.failure_ratio = 1.5;
        config.retries.request.multiplier = 0.5;
        config.retries.startup.initial_interval_ms = 10_000;
        config.retries.startup.max_interval_ms = 1_000;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "database.user",
                "breaker.failure_ratio",
                "retries.request.multiplier",
                "retries.startup.max_interval_ms",
            ]
        );
    }

    #[test]
    fn test_read_port_requires_read_host() {
        let mut config = ServiceConfig::default();
        config.database.read_port = Some(5433);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("database.read_port"));
    }

    #[test]
    fn test_request_timeout_must_outlast_retry_budget() {
        let mut config = ServiceConfig::default();
        config.timeouts.request_secs = 2;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
        assert!(errors[0].message.contains("5000ms"));

        config.timeouts.request_secs = 5;
        assert!(validate_config(&config).is_err());

        config.timeouts.request_secs = 6;
        assert!(validate_config(&config).is_ok());

        config.timeouts.request_secs = 1;
        config.retries.request.max_elapsed_ms = 500;
        assert!(validate_config(&config).is_ok());
    }
}
