//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Database operation:
//!     → circuit_breaker.rs (fail fast while the database is judged unhealthy)
//!     → retries.rs (re-run transient failures with backoff, bounded by elapsed time)
//!     → backoff.rs (interval between attempts)
//! ```
//!
//! # Design Decisions
//! - The breaker wraps the retry loop, so one exhausted retry loop is one failure sample
//! - Retries never outlive their elapsed-time budget
//! - Breaker state is the only shared mutable state, guarded by one lock

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;

pub use circuit_breaker::{BreakerError, BreakerSettings, CircuitBreaker, CircuitState, Counts};
pub use retries::{RetryError, RetryExecutor, RetryObserver, RetryPolicy, TracingObserver};
