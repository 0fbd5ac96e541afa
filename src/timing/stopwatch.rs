//! Pausable elapsed-time accumulator.
//!
//! Resuming after a pause shifts the origin forward by the length of the
//! pause, so the running-state read stays a single subtraction and paused
//! intervals are excluded exactly.
//!
//! Redundant calls are no-ops, never errors: `pause()` before `start()`,
//! `pause()` while paused and `start()` while running all leave the state as
//! it was.

use std::time::{Duration, Instant};

use super::clock::{Clock, MonotonicClock};

/// Externally visible stopwatch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchStatus {
    NotStarted,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Running {
        origin: Instant,
    },
    Paused {
        origin: Instant,
        paused_at: Instant,
        elapsed: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct Stopwatch<C: Clock = MonotonicClock> {
    clock: C,
    state: State,
}

impl Stopwatch<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for Stopwatch<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Stopwatch<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: State::NotStarted,
        }
    }

    /// Start, or resume from a pause. No-op while running.
    pub fn start(&mut self) {
        self.state = match self.state {
            State::NotStarted => State::Running {
                origin: self.clock.now(),
            },
            State::Paused {
                origin, paused_at, ..
            } => {
                let pause_len = self.clock.now().saturating_duration_since(paused_at);
                State::Running {
                    origin: origin + pause_len,
                }
            }
            running @ State::Running { .. } => running,
        };
    }

    /// Freeze the elapsed time. No-op unless running.
    pub fn pause(&mut self) {
        if let State::Running { origin } = self.state {
            let now = self.clock.now();
            self.state = State::Paused {
                origin,
                paused_at: now,
                elapsed: now.saturating_duration_since(origin),
            };
        }
    }

    /// Back to not-started, discarding all recorded times.
    pub fn reset(&mut self) {
        self.state = State::NotStarted;
    }

    /// Time spent running since the last reset, excluding pauses.
    pub fn elapsed_time(&self) -> Duration {
        match self.state {
            State::NotStarted => Duration::ZERO,
            State::Running { origin } => self.clock.now().saturating_duration_since(origin),
            State::Paused { elapsed, .. } => elapsed,
        }
    }

    pub fn status(&self) -> StopwatchStatus {
        match self.state {
            State::NotStarted => StopwatchStatus::NotStarted,
            State::Running { .. } => StopwatchStatus::Running,
            State::Paused { .. } => StopwatchStatus::Paused,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status() == StopwatchStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status() == StopwatchStatus::Paused
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualClock;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn manual() -> (ManualClock, Stopwatch<ManualClock>) {
        let clock = ManualClock::new();
        let sw = Stopwatch::with_clock(clock.clone());
        (clock, sw)
    }

    #[test]
    fn not_started_reads_zero() {
        let (clock, sw) = manual();
        clock.advance(secs(5));
        assert_eq!(sw.status(), StopwatchStatus::NotStarted);
        assert_eq!(sw.elapsed_time(), Duration::ZERO);
    }

    #[test]
    fn running_tracks_clock() {
        let (clock, mut sw) = manual();
        sw.start();
        clock.advance(secs(3));
        assert_eq!(sw.elapsed_time(), secs(3));
        clock.advance(secs(2));
        assert_eq!(sw.elapsed_time(), secs(5));
    }

    #[test]
    fn paused_reads_are_constant() {
        let (clock, mut sw) = manual();
        sw.start();
        clock.advance(secs(4));
        sw.pause();
        assert!(sw.is_paused());
        for _ in 0..3 {
            clock.advance(secs(10));
            assert_eq!(sw.elapsed_time(), secs(4));
        }
    }

    #[test]
    fn resume_excludes_pause_interval() {
        let (clock, mut sw) = manual();
        sw.start();
        clock.advance(secs(2));
        sw.pause();
        clock.advance(secs(30));
        sw.start();
        assert_eq!(sw.elapsed_time(), secs(2));
        clock.advance(secs(1));
        assert_eq!(sw.elapsed_time(), secs(3));
    }

    #[test]
    fn pause_then_immediate_resume_is_continuous() {
        let (clock, mut sw) = manual();
        sw.start();
        clock.advance(Duration::from_millis(1500));
        let before = sw.elapsed_time();
        sw.pause();
        sw.start();
        let after = sw.elapsed_time();
        assert_eq!(before, after);
    }

    #[test]
    fn double_start_is_noop() {
        let (clock, mut once) = manual();
        let mut twice = Stopwatch::with_clock(clock.clone());
        once.start();
        twice.start();
        clock.advance(secs(1));
        twice.start();
        clock.advance(secs(1));
        assert_eq!(once.elapsed_time(), twice.elapsed_time());
        assert_eq!(twice.elapsed_time(), secs(2));
    }

    #[test]
    fn pause_before_start_is_noop() {
        let (clock, mut sw) = manual();
        sw.pause();
        assert_eq!(sw.status(), StopwatchStatus::NotStarted);
        sw.start();
        clock.advance(secs(1));
        assert_eq!(sw.elapsed_time(), secs(1));
    }

    #[test]
    fn double_pause_keeps_first_pause_point() {
        let (clock, mut sw) = manual();
        sw.start();
        clock.advance(secs(2));
        sw.pause();
        clock.advance(secs(5));
        sw.pause();
        clock.advance(secs(5));
        sw.start();
        // Both pauses belong to one 10 s interval that is excluded
        clock.advance(secs(1));
        assert_eq!(sw.elapsed_time(), secs(3));
    }

    #[test]
    fn reset_returns_to_not_started_from_any_state() {
        let (clock, mut sw) = manual();
        sw.reset();
        assert_eq!(sw.status(), StopwatchStatus::NotStarted);

        sw.start();
        clock.advance(secs(3));
        sw.reset();
        assert_eq!(sw.status(), StopwatchStatus::NotStarted);
        assert_eq!(sw.elapsed_time(), Duration::ZERO);

        sw.start();
        clock.advance(secs(3));
        sw.pause();
        sw.reset();
        assert_eq!(sw.status(), StopwatchStatus::NotStarted);
        assert_eq!(sw.elapsed_time(), Duration::ZERO);

        // Fresh origin after reset
        sw.start();
        clock.advance(secs(1));
        assert_eq!(sw.elapsed_time(), secs(1));
    }

    #[test]
    fn elapsed_is_monotonic_across_mixed_calls() {
        let (clock, mut sw) = manual();
        let mut last = Duration::ZERO;
        for step in 0..40u64 {
            match step % 5 {
                0 | 3 => sw.start(),
                2 => sw.pause(),
                _ => {}
            }
            clock.advance(Duration::from_millis(100 + step * 7));
            let now = sw.elapsed_time();
            assert!(now >= last, "elapsed went backwards at step {step}");
            last = now;
        }
    }

    #[test]
    fn system_clock_stopwatch_advances() {
        let mut sw = Stopwatch::new();
        sw.start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(sw.elapsed_time() >= Duration::from_millis(5));
    }
}
