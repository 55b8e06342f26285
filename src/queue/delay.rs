//! Randomized spacing between jobs.

use rand::Rng;
use std::time::Duration;

/// `base + uniform(0..=jitter_max)` pause applied after every job
///
/// Spacing scrapes irregularly keeps a burst of tab opens from reading as one
/// automated visitor. Tests use [`DelayPolicy::none`] for determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    base: Duration,
    jitter_max: Duration,
}

impl DelayPolicy {
    #[must_use]
    pub fn new(base: Duration, jitter_max: Duration) -> Self {
        Self { base, jitter_max }
    }

    /// No delay at all
    #[must_use]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    #[must_use]
    pub fn base(&self) -> Duration {
        self.base
    }

    #[must_use]
    pub fn jitter_max(&self) -> Duration {
        self.jitter_max
    }

    /// Draw the next pause
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter_ms = u64::try_from(self.jitter_max.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rng.random_range(0..=jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_jitter_is_exactly_base() {
        let policy = DelayPolicy::new(Duration::from_millis(250), Duration::ZERO);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(policy.next_delay(&mut rng), Duration::from_millis(250));
        }
    }

    #[test]
    fn delay_stays_within_bounds() {
        let policy = DelayPolicy::new(Duration::from_secs(2), Duration::from_secs(3));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let d = policy.next_delay(&mut rng);
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(5), "{d:?}");
        }
    }
}
