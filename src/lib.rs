//! Todo service with a resilient data access layer.

pub mod config;
pub mod db;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod secrets;
pub mod store;
pub mod todos;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
