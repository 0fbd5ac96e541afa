//! Time sources for the stopwatch.
//!
//! Production code reads the monotonic system clock. Tests and the offline
//! simulation use [`ManualClock`], which only moves when told to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The process monotonic clock (`Instant::now()`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that advances only via [`advance`](ManualClock::advance).
///
/// Clones share the same offset, so a session's two stopwatches and the code
/// driving simulated time all observe one timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn advance_secs_f64(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs.max(0.0)));
    }

    /// Simulated time since the clock was created
    pub fn offset(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::Relaxed))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - t0, Duration::from_millis(250));
    }

    #[test]
    fn clones_share_one_timeline() {
        let clock = ManualClock::new();
        let other = clock.clone();
        other.advance_secs_f64(2.5);
        assert_eq!(clock.offset(), Duration::from_millis(2500));
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
