//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! On demand (GET /healthz):
//!     probe.rs → ping primary (fatal) → ping replica if distinct (logged only)
//!
//! Background (monitor.rs):
//!     Periodic timer
//!     → probe.rs
//!     → log readiness transitions, update liveness gauges
//! ```

pub mod monitor;
pub mod probe;

pub use monitor::HealthMonitor;
pub use probe::{HealthProbe, HealthReport, PingStatus, ProbeError};
