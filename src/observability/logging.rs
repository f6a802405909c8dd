//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Choose the output format (pretty for development, JSON for aggregation)
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - The configured level applies to this crate and tower-http request traces

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: &str) -> String {
    format!("todo_service={level},tower_http={level}")
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json().with_current_span(false)).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        let directives = default_directives("debug");
        assert_eq!(directives, "todo_service=debug,tower_http=debug");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
