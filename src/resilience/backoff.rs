//! Exponential backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

/// Generates the wait between consecutive attempts.
///
/// The base interval starts at `initial`, is multiplied by `multiplier`
/// after every call to [`ExponentialBackoff::next_delay`] and is capped at
/// `max`. With a non-zero `randomization_factor` the returned delay is drawn
/// uniformly from `base * (1 ± factor)`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    max: Duration,
    multiplier: f64,
    randomization_factor: f64,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            max,
            multiplier,
            randomization_factor: 0.0,
            current: initial,
        }
    }

    /// Spread each delay by `±factor` of its base value.
    pub fn with_randomization(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Return the delay for the next retry and advance the interval.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current;
        let grown = Duration::from_nanos((base.as_nanos() as f64 * self.multiplier) as u64);
        self.current = grown.min(self.max);
        jitter(base, self.randomization_factor)
    }
}

fn jitter(base: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return base;
    }

    let nanos = base.as_nanos() as f64;
    let delta = nanos * factor;
    let (low, high) = (nanos - delta, nanos + delta);
    if high <= low {
        return base;
    }

    Duration::from_nanos(rand::thread_rng().gen_range(low..high) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_growth_and_cap() {
        let mut b = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_millis(300),
            2.0,
        );

        assert_eq!(b.next_delay(), Duration::from_millis(100));
        assert_eq!(b.next_delay(), Duration::from_millis(200));
        assert_eq!(b.next_delay(), Duration::from_millis(300));
        assert_eq!(b.next_delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let mut b = ExponentialBackoff::new(Duration::from_millis(1000), Duration::from_secs(10), 1.0)
            .with_randomization(0.5);

        for _ in 0..50 {
            let d = b.next_delay();
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(1500));
        }
    }
}
