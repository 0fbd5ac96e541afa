//! posture-score: seated posture scoring from pose landmarks
//!
//! Scores a sitting session by the share of time spent in good posture.
//!
//! ## Architecture
//!
//! - **Timing**: pausable stopwatch over an injectable monotonic clock
//! - **Classifier**: pure per-frame Good / Slouching verdict from six keypoints
//! - **Session**: drives the posture and total stopwatches from each verdict,
//!   and computes the final score
//! - **Pipeline**: async frame loop over a replay file or a live stdin stream,
//!   with cooperative cancellation

pub mod classifier;
pub mod config;
pub mod display;
pub mod pipeline;
pub mod session;
pub mod timing;
pub mod types;

// Re-export configuration
pub use config::{PostureConfig, PostureThresholds};

// Re-export commonly used types
pub use types::{
    FrameRecord, Landmark, LandmarkKind, LandmarkSnapshot, PostureAssessment, PostureMeasurement,
    PostureVerdict, Violation,
};

// Re-export core components
pub use classifier::{classify, ClassifyError, PostureClassifier};
pub use session::{compute_score, FrameOutcome, ScoreError, Session, SessionExit, SessionReport};
pub use timing::{Clock, ManualClock, MonotonicClock, Stopwatch};
