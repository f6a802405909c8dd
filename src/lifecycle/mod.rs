//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Secret → Connections → Breaker/Retry/Facade → Probe + Monitor
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Server drains, monitor exits → Close pools
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config and logging first, listener last
//! - A primary that never becomes reachable aborts startup

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, bootstrap_with, Service, StartupError};
