//! Session timing: a pausable stopwatch over an injectable monotonic clock.

mod clock;
mod stopwatch;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use stopwatch::{Stopwatch, StopwatchStatus};
