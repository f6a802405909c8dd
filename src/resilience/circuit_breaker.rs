//! Circuit breaker for database protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: database assumed down, calls fail fast
//! - Half-Open: a limited number of trial calls probe for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: requests >= min_requests AND failures / requests >= failure_ratio
//! Open → Half-Open: open_timeout elapsed since the breaker opened
//! Half-Open → Closed: trial calls succeed
//! Half-Open → Open: any trial call fails
//! ```
//!
//! # Design Decisions
//! - One breaker per process, shared by cloning the handle
//! - All state lives behind a single mutex; no await inside the critical section
//! - Every transition starts a new generation and resets counts; outcomes
//!   reported for an older generation are discarded
//! - Half-Open admission is a permit counter checked and taken under the lock,
//!   released by an RAII guard so a dropped trial never wedges the breaker

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome counters for the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
}

impl Counts {
    fn on_success(&mut self) {
        self.requests += 1;
        self.consecutive_successes += 1;
    }

    fn on_failure(&mut self) {
        self.requests += 1;
        self.total_failures += 1;
        self.consecutive_successes = 0;
    }

    pub fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            f64::from(self.total_failures) / f64::from(self.requests)
        }
    }
}

/// Tuning for the breaker.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    pub name: String,
    /// Concurrent trial calls admitted while Half-Open.
    pub max_half_open_requests: u32,
    pub open_timeout: Duration,
    pub min_requests: u32,
    pub failure_ratio: f64,
    /// Cyclic reset of Closed-state counts. `None` keeps counts until a transition.
    pub interval: Option<Duration>,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            name: "DatabaseCB".to_string(),
            max_half_open_requests: 1,
            open_timeout: Duration::from_secs(30),
            min_requests: 3,
            failure_ratio: 0.6,
            interval: None,
        }
    }
}

impl From<&BreakerConfig> for BreakerSettings {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            name: config.name.clone(),
            max_half_open_requests: config.max_half_open_requests,
            open_timeout: Duration::from_secs(config.open_timeout_secs),
            min_requests: config.min_requests,
            failure_ratio: config.failure_ratio,
            interval: (config.interval_secs > 0).then(|| Duration::from_secs(config.interval_secs)),
        }
    }
}

impl BreakerSettings {
    fn ready_to_trip(&self, counts: &Counts) -> bool {
        counts.requests >= self.min_requests && counts.failure_ratio() >= self.failure_ratio
    }
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The call was rejected without running the operation.
    #[error("circuit breaker is open")]
    Open,

    /// The operation ran and failed.
    #[error("{0}")]
    Inner(E),
}

impl<E> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open)
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    counts: Counts,
    generation: u64,
    /// When the current state was entered.
    since: Instant,
    /// Trial calls currently running while Half-Open.
    trials_in_flight: u32,
}

/// Shared circuit breaker handle.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    settings: Arc<BreakerSettings>,
    state: Arc<Mutex<BreakerState>>,
}

impl CircuitBreaker {
    pub fn new(settings: BreakerSettings) -> Self {
        metrics::record_breaker_state(&settings.name, CircuitState::Closed);
        Self {
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                counts: Counts::default(),
                generation: 0,
                since: Instant::now(),
                trials_in_flight: 0,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Current state, applying any timeout-driven transition first.
    pub fn state(&self) -> CircuitState {
        let mut guard = self.lock();
        self.refresh(&mut guard, Instant::now());
        guard.state
    }

    /// Counts of the current generation.
    pub fn counts(&self) -> Counts {
        let mut guard = self.lock();
        self.refresh(&mut guard, Instant::now());
        guard.counts
    }

    /// Run `op` if the breaker admits it and record the outcome.
    ///
    /// While Open, or Half-Open with every trial permit taken, returns
    /// [`BreakerError::Open`] without invoking `op`.
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admit()?;
        let result = op().await;
        admission.complete(result.is_ok());
        result.map_err(BreakerError::Inner)
    }

    fn admit<E>(&self) -> Result<Admission<'_>, BreakerError<E>> {
        let mut guard = self.lock();
        let now = Instant::now();
        self.refresh(&mut guard, now);

        let trial = match guard.state {
            CircuitState::Closed => false,
            CircuitState::Open => return Err(self.reject()),
            CircuitState::HalfOpen => {
                if guard.trials_in_flight >= self.settings.max_half_open_requests {
                    return Err(self.reject());
                }
                guard.trials_in_flight += 1;
                true
            }
        };

        Ok(Admission {
            breaker: self,
            generation: guard.generation,
            trial,
            completed: false,
        })
    }

    fn reject<E>(&self) -> BreakerError<E> {
        metrics::record_breaker_rejection(&self.settings.name);
        BreakerError::Open
    }

    fn on_outcome(&self, generation: u64, trial: bool, success: bool) {
        let mut guard = self.lock();
        let now = Instant::now();
        self.refresh(&mut guard, now);

        if guard.generation != generation {
            return;
        }
        if trial {
            guard.trials_in_flight = guard.trials_in_flight.saturating_sub(1);
        }

        match (guard.state, success) {
            (CircuitState::Closed, true) => guard.counts.on_success(),
            (CircuitState::Closed, false) => {
                guard.counts.on_failure();
                if self.settings.ready_to_trip(&guard.counts) {
                    self.transition(&mut guard, CircuitState::Open, now);
                }
            }
            (CircuitState::HalfOpen, true) => {
                guard.counts.on_success();
                if guard.counts.consecutive_successes >= self.settings.max_half_open_requests {
                    self.transition(&mut guard, CircuitState::Closed, now);
                }
            }
            (CircuitState::HalfOpen, false) => {
                self.transition(&mut guard, CircuitState::Open, now);
            }
            (CircuitState::Open, _) => {}
        }
    }

    fn release_trial(&self, generation: u64) {
        let mut guard = self.lock();
        if guard.generation == generation {
            guard.trials_in_flight = guard.trials_in_flight.saturating_sub(1);
        }
    }

    /// Apply transitions that depend only on elapsed time.
    fn refresh(&self, state: &mut BreakerState, now: Instant) {
        match state.state {
            CircuitState::Open => {
                if now.duration_since(state.since) >= self.settings.open_timeout {
                    self.transition(state, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::Closed => {
                if let Some(interval) = self.settings.interval {
                    if now.duration_since(state.since) >= interval {
                        state.generation += 1;
                        state.counts = Counts::default();
                        state.since = now;
                    }
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn transition(&self, state: &mut BreakerState, to: CircuitState, now: Instant) {
        let from = state.state;
        if from == to {
            return;
        }

        state.state = to;
        state.generation += 1;
        state.counts = Counts::default();
        state.since = now;
        state.trials_in_flight = 0;

        tracing::warn!(
            name = %self.settings.name,
            from = %from,
            to = %to,
            "Circuit breaker state changed"
        );
        metrics::record_breaker_state(&self.settings.name, to);
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // State is only mutated through complete assignments, so a poisoned
        // lock still holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerSettings::default())
    }
}

/// Admission ticket for one call.
///
/// Dropping it without [`Admission::complete`] (the caller's future was
/// cancelled) records no outcome but hands back a Half-Open trial permit.
struct Admission<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    completed: bool,
}

impl Admission<'_> {
    fn complete(mut self, success: bool) {
        self.completed = true;
        self.breaker.on_outcome(self.generation, self.trial, success);
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if !self.completed && self.trial {
            self.breaker.release_trial(self.generation);
        }
    }
}
