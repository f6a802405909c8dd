//! Retry logic.
//!
//! # Responsibilities
//! - Re-run a failed operation with exponential backoff
//! - Give up once the elapsed-time budget since the first attempt is spent
//! - Report each failed attempt to an observer
//!
//! # Design Decisions
//! - The budget is elapsed time, not an attempt count
//! - Backoff sleeps run on the calling task, so concurrent callers retry independently
//! - Every error is transient unless the operation tags it `Permanent`
//! - Observer failures never reach the retry loop

use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::ExponentialBackoff;

/// Backoff parameters and elapsed-time budget for one call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_elapsed_time: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,
}

impl RetryPolicy {
    /// Short budget for request-serving calls.
    pub fn request() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
            max_elapsed_time: Duration::from_secs(5),
            multiplier: 1.5,
            randomization_factor: 0.0,
        }
    }

    /// Long budget for establishing connections at startup.
    pub fn startup() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(120),
            multiplier: 1.5,
            randomization_factor: 0.5,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.initial_interval, self.max_interval, self.multiplier)
            .with_randomization(self.randomization_factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::request()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            max_elapsed_time: Duration::from_millis(config.max_elapsed_ms),
            multiplier: config.multiplier,
            randomization_factor: config.randomization_factor,
        }
    }
}

/// Failure of a single attempt, tagged with whether another attempt may help.
///
/// `From<E>` produces `Transient`, so `?` inside an operation retries by default.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("{0}")]
    Transient(E),

    #[error("{0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    pub fn is_permanent(&self) -> bool {
        matches!(self, RetryError::Permanent(_))
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Transient(e) | RetryError::Permanent(e) => e,
        }
    }
}

impl<E> From<E> for RetryError<E> {
    fn from(error: E) -> Self {
        RetryError::Transient(error)
    }
}

/// Receives a notification for every failed attempt that will be retried.
///
/// Called synchronously between attempts: implementations must return
/// quickly and must not block. Panics are caught and logged.
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, operation: &str, attempt: u32, error: &dyn fmt::Display, next_delay: Duration);
}

/// Logs each retry as a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, operation: &str, attempt: u32, error: &dyn fmt::Display, next_delay: Duration) {
        tracing::warn!(
            operation,
            attempt,
            error = %error,
            next_delay_ms = next_delay.as_millis() as u64,
            "Database operation failed, retrying"
        );
    }
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    observer: Arc<dyn RetryObserver>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the default logging observer.
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run `op` until it succeeds, fails permanently, or the next wait would
    /// take the total elapsed time past `max_elapsed_time`.
    ///
    /// Returns the error of the last attempt on exhaustion.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RetryError<E>>>,
        E: fmt::Display,
    {
        let started = Instant::now();
        let mut backoff = self.policy.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let error = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation, attempts = attempt, "Operation recovered after retries");
                    }
                    return Ok(value);
                }
                Err(RetryError::Permanent(e)) => {
                    tracing::warn!(operation, attempts = attempt, error = %e, "Permanent failure, not retrying");
                    return Err(e);
                }
                Err(RetryError::Transient(e)) => e,
            };

            let elapsed = started.elapsed();
            let next_delay = backoff.next_delay();
            if elapsed + next_delay > self.policy.max_elapsed_time {
                tracing::error!(
                    operation,
                    attempts = attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "Retry budget exhausted"
                );
                return Err(error);
            }

            self.notify(operation, attempt, &error, next_delay);
            metrics::record_retry(operation);
            tokio::time::sleep(next_delay).await;
        }
    }

    fn notify(&self, operation: &str, attempt: u32, error: &dyn fmt::Display, next_delay: Duration) {
        let observer = &self.observer;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            observer.on_retry(operation, attempt, error, next_delay)
        }));
        if outcome.is_err() {
            tracing::error!(operation, attempt, "Retry observer panicked");
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish()
    }
}
