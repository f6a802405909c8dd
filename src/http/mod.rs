//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, trace span)
//!     → handlers.rs (validate input, call repository or probe)
//!     → error.rs (error → status + plain-text body)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
