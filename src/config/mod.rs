//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (DB_HOST, DB_READ_HOST, ...)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to lifecycle::startup to build subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file so one image runs in every environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError};
pub use schema::{
    BreakerConfig, DatabaseConfig, HealthConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RetriesConfig, RetryConfig, SecretSource, SecretsConfig, ServiceConfig, StoreBackend,
    TimeoutConfig,
};
