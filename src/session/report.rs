//! End-of-session report and per-session frame statistics.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

use super::{compute_score, FrameOutcome, ScoreError};
use crate::types::PostureVerdict;

// ============================================================================
// Frame Statistics
// ============================================================================

/// Frame counters accumulated over a session.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub good_frames: u64,
    pub slouching_frames: u64,
    /// Frames where the detector found nobody
    pub undetected_frames: u64,
    /// Frames missing a shoulder, ear or hip keypoint
    pub missing_landmark_frames: u64,
    /// Longest run of consecutive Good verdicts; unclassified frames neither
    /// extend nor break a run
    pub longest_good_streak: u64,
    #[serde(skip)]
    current_good_streak: u64,
}

impl SessionStats {
    pub(crate) fn record(&mut self, outcome: &FrameOutcome) {
        self.frames += 1;
        match outcome {
            FrameOutcome::Assessed(a) => match a.verdict {
                PostureVerdict::Good => {
                    self.good_frames += 1;
                    self.current_good_streak += 1;
                    self.longest_good_streak =
                        self.longest_good_streak.max(self.current_good_streak);
                }
                PostureVerdict::Slouching => {
                    self.slouching_frames += 1;
                    self.current_good_streak = 0;
                }
            },
            FrameOutcome::NoDetection => self.undetected_frames += 1,
            FrameOutcome::MissingLandmark(_) => self.missing_landmark_frames += 1,
        }
    }

    /// Frames that produced a verdict
    pub fn classified_frames(&self) -> u64 {
        self.good_frames + self.slouching_frames
    }
}

// ============================================================================
// Session Exit
// ============================================================================

/// Why the frame loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SessionExit {
    /// Frame source ran out of frames
    EndOfStream,
    /// User stop signal
    Cancelled,
    /// Configured maximum duration reached
    TimeLimit,
    /// Capture device or frame source failed
    CaptureFailure(String),
}

impl std::fmt::Display for SessionExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionExit::EndOfStream => write!(f, "end of stream"),
            SessionExit::Cancelled => write!(f, "cancelled"),
            SessionExit::TimeLimit => write!(f, "time limit reached"),
            SessionExit::CaptureFailure(e) => write!(f, "capture failure: {e}"),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Everything known about a finished session.
///
/// Serializes to JSON with durations as fractional seconds.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub exit: SessionExit,
    #[serde(rename = "posture_elapsed_secs", serialize_with = "serialize_secs")]
    pub posture_elapsed: Duration,
    #[serde(rename = "total_elapsed_secs", serialize_with = "serialize_secs")]
    pub total_elapsed: Duration,
    /// Percentage in [0, 100]; `None` for a degenerate session
    pub score: Option<f64>,
    pub stats: SessionStats,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl SessionReport {
    pub(crate) fn new(
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        exit: SessionExit,
        posture_elapsed: Duration,
        total_elapsed: Duration,
        stats: SessionStats,
    ) -> Self {
        Self {
            started_at,
            ended_at,
            exit,
            posture_elapsed,
            total_elapsed,
            score: compute_score(posture_elapsed, total_elapsed).ok(),
            stats,
        }
    }

    /// The score, or why there is none.
    pub fn score_result(&self) -> Result<f64, ScoreError> {
        compute_score(self.posture_elapsed, self.total_elapsed)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
