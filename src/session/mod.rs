//! Session Controller
//!
//! Owns the two session stopwatches and applies each frame's verdict to them:
//!
//! - `total_timer` starts with the session and never pauses
//! - `posture_timer` runs while the latest classified frame is Good and pauses
//!   while it is Slouching
//! - frames with no detection, or with a required landmark missing, leave
//!   `posture_timer` exactly as it was
//!
//! At the end the score is `posture / total * 100`, clamped to [0, 100].

mod report;
mod score;

pub use report::{SessionExit, SessionReport, SessionStats};
pub use score::{compute_score, ScoreError};

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

use crate::classifier::{ClassifyError, PostureClassifier};
use crate::config::PostureConfig;
use crate::timing::{Clock, MonotonicClock, Stopwatch, StopwatchStatus};
use crate::types::{LandmarkKind, LandmarkSnapshot, PostureAssessment, PostureVerdict};

/// What the session did with one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Classified; posture timer started or paused accordingly
    Assessed(PostureAssessment),
    /// Detector found nobody; timers untouched
    NoDetection,
    /// Detector output lacked a required keypoint; timers untouched
    MissingLandmark(LandmarkKind),
}

impl FrameOutcome {
    pub fn verdict(&self) -> Option<PostureVerdict> {
        match self {
            FrameOutcome::Assessed(a) => Some(a.verdict),
            _ => None,
        }
    }

    pub fn assessment(&self) -> Option<&PostureAssessment> {
        match self {
            FrameOutcome::Assessed(a) => Some(a),
            _ => None,
        }
    }
}

pub struct Session<C: Clock + Clone = MonotonicClock> {
    total_timer: Stopwatch<C>,
    posture_timer: Stopwatch<C>,
    classifier: PostureClassifier,
    stats: SessionStats,
    started_at: Option<DateTime<Utc>>,
    last_verdict: Option<PostureVerdict>,
}

impl Session<MonotonicClock> {
    pub fn new(classifier: PostureClassifier) -> Self {
        Self::with_clock(classifier, MonotonicClock)
    }

    pub fn from_config(config: &PostureConfig) -> Self {
        Self::new(classifier_from_config(config))
    }
}

/// Build the classifier described by `config`.
pub fn classifier_from_config(config: &PostureConfig) -> PostureClassifier {
    PostureClassifier::new(config.thresholds).with_min_visibility(config.detection.min_visibility)
}

impl<C: Clock + Clone> Session<C> {
    /// Both stopwatches read from clones of `clock`.
    pub fn with_clock(classifier: PostureClassifier, clock: C) -> Self {
        Self {
            total_timer: Stopwatch::with_clock(clock.clone()),
            posture_timer: Stopwatch::with_clock(clock),
            classifier,
            stats: SessionStats::default(),
            started_at: None,
            last_verdict: None,
        }
    }

    /// Start both timers together. Only the first call has an effect.
    pub fn start(&mut self) {
        if self.started_at.is_some() {
            return;
        }
        self.total_timer.start();
        self.posture_timer.start();
        self.started_at = Some(Utc::now());
        debug!("Session timers started");
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Apply one frame of detector output.
    ///
    /// Starts the session on first use if [`start`](Self::start) was not called.
    pub fn process_frame(&mut self, snapshot: Option<&LandmarkSnapshot>) -> FrameOutcome {
        self.start();

        let outcome = match snapshot {
            None => FrameOutcome::NoDetection,
            Some(snapshot) => match self.classifier.classify(snapshot) {
                Ok(assessment) => {
                    match assessment.verdict {
                        PostureVerdict::Good => self.posture_timer.start(),
                        PostureVerdict::Slouching => self.posture_timer.pause(),
                    }
                    self.last_verdict = Some(assessment.verdict);
                    FrameOutcome::Assessed(assessment)
                }
                Err(ClassifyError::MissingLandmark(kind)) => {
                    debug!(landmark = %kind, "Frame skipped: landmark missing");
                    FrameOutcome::MissingLandmark(kind)
                }
            },
        };

        self.stats.record(&outcome);
        outcome
    }

    /// Time spent in good posture so far.
    pub fn posture_elapsed(&self) -> Duration {
        self.posture_timer.elapsed_time()
    }

    /// Time since the session started.
    pub fn total_elapsed(&self) -> Duration {
        self.total_timer.elapsed_time()
    }

    /// Running score, without ending the session.
    pub fn current_score(&self) -> Result<f64, ScoreError> {
        compute_score(self.posture_elapsed(), self.total_elapsed())
    }

    pub fn posture_status(&self) -> StopwatchStatus {
        self.posture_timer.status()
    }

    pub fn last_verdict(&self) -> Option<PostureVerdict> {
        self.last_verdict
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn classifier(&self) -> &PostureClassifier {
        &self.classifier
    }

    /// End the session and read both timers once.
    ///
    /// The posture timer is started one last time before reading. When it is
    /// already running this is a no-op; when paused it resumes at the same
    /// elapsed value, so the reading is unchanged either way.
    pub fn finish(mut self, exit: SessionExit) -> SessionReport {
        self.posture_timer.start();
        let posture_elapsed = self.posture_timer.elapsed_time();
        let total_elapsed = self.total_timer.elapsed_time();
        let ended_at = Utc::now();

        SessionReport::new(
            self.started_at.unwrap_or(ended_at),
            ended_at,
            exit,
            posture_elapsed,
            total_elapsed,
            self.stats,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualClock;
    use crate::types::Landmark;

    fn snapshot(ear_offset: f64) -> LandmarkSnapshot {
        [
            (LandmarkKind::LeftEar, Landmark::new(0.40 - ear_offset, 0.20)),
            (LandmarkKind::RightEar, Landmark::new(0.60, 0.20)),
            (LandmarkKind::LeftShoulder, Landmark::new(0.40, 0.40)),
            (LandmarkKind::RightShoulder, Landmark::new(0.60, 0.40)),
            (LandmarkKind::LeftHip, Landmark::new(0.40, 0.80)),
            (LandmarkKind::RightHip, Landmark::new(0.60, 0.80)),
        ]
        .into_iter()
        .collect()
    }

    fn good() -> LandmarkSnapshot {
        snapshot(0.0)
    }

    fn slouch() -> LandmarkSnapshot {
        snapshot(0.2)
    }

    fn manual_session() -> (ManualClock, Session<ManualClock>) {
        let clock = ManualClock::new();
        let session = Session::with_clock(PostureClassifier::default(), clock.clone());
        (clock, session)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn eight_of_ten_seconds_scores_eighty() {
        let (clock, mut session) = manual_session();
        session.start();

        session.process_frame(Some(&good()));
        clock.advance(secs(6));
        session.process_frame(Some(&slouch()));
        clock.advance(secs(2));
        session.process_frame(Some(&good()));
        clock.advance(secs(2));

        let report = session.finish(SessionExit::EndOfStream);
        assert_eq!(report.posture_elapsed, secs(8));
        assert_eq!(report.total_elapsed, secs(10));
        assert_eq!(report.score, Some(80.0));
        assert_eq!(format!("{:.2}", report.score.unwrap()), "80.00");
    }

    #[test]
    fn undetected_frames_leave_posture_timer_unchanged() {
        let (clock, mut session) = manual_session();
        session.process_frame(Some(&slouch()));
        assert_eq!(session.posture_status(), StopwatchStatus::Paused);

        clock.advance(secs(3));
        assert_eq!(session.process_frame(None), FrameOutcome::NoDetection);
        assert_eq!(session.posture_status(), StopwatchStatus::Paused);

        session.process_frame(Some(&good()));
        assert_eq!(session.posture_status(), StopwatchStatus::Running);
        clock.advance(secs(3));
        assert_eq!(session.process_frame(None), FrameOutcome::NoDetection);
        assert_eq!(session.posture_status(), StopwatchStatus::Running);
        clock.advance(secs(1));
        assert_eq!(session.posture_elapsed(), secs(4));
    }

    #[test]
    fn missing_landmark_leaves_posture_timer_unchanged() {
        let (clock, mut session) = manual_session();
        session.process_frame(Some(&slouch()));

        let partial: LandmarkSnapshot = good()
            .iter()
            .filter(|(k, _)| *k != LandmarkKind::LeftHip)
            .map(|(k, v)| (k, *v))
            .collect();
        clock.advance(secs(2));
        assert_eq!(
            session.process_frame(Some(&partial)),
            FrameOutcome::MissingLandmark(LandmarkKind::LeftHip)
        );
        assert_eq!(session.posture_status(), StopwatchStatus::Paused);
        assert_eq!(session.stats().missing_landmark_frames, 1);
    }

    #[test]
    fn total_timer_never_pauses() {
        let (clock, mut session) = manual_session();
        session.process_frame(Some(&slouch()));
        clock.advance(secs(5));
        session.process_frame(Some(&slouch()));
        clock.advance(secs(5));
        assert_eq!(session.total_elapsed(), secs(10));
        assert_eq!(session.posture_elapsed(), Duration::ZERO);
    }

    #[test]
    fn finishing_while_slouching_keeps_reading() {
        let (clock, mut session) = manual_session();
        session.process_frame(Some(&good()));
        clock.advance(secs(3));
        session.process_frame(Some(&slouch()));
        clock.advance(secs(1));

        let report = session.finish(SessionExit::Cancelled);
        assert_eq!(report.posture_elapsed, secs(3));
        assert_eq!(report.total_elapsed, secs(4));
        assert_eq!(report.score, Some(75.0));
    }

    #[test]
    fn immediate_finish_is_degenerate() {
        let (_clock, mut session) = manual_session();
        session.start();
        let report = session.finish(SessionExit::EndOfStream);
        assert_eq!(report.total_elapsed, Duration::ZERO);
        assert_eq!(report.score, None);
        assert_eq!(report.score_result(), Err(ScoreError::DegenerateSession));
    }

    #[test]
    fn never_started_session_is_degenerate() {
        let (clock, session) = manual_session();
        clock.advance(secs(5));
        let report = session.finish(SessionExit::EndOfStream);
        assert_eq!(report.score_result(), Err(ScoreError::DegenerateSession));
    }

    #[test]
    fn start_is_only_applied_once() {
        let (clock, mut session) = manual_session();
        session.start();
        session.process_frame(Some(&slouch()));
        clock.advance(secs(2));
        // A second start must not resume the paused posture timer
        session.start();
        clock.advance(secs(2));
        assert_eq!(session.posture_elapsed(), Duration::ZERO);
        assert_eq!(session.total_elapsed(), secs(4));
    }

    #[test]
    fn stats_count_every_outcome() {
        let (_clock, mut session) = manual_session();
        session.process_frame(Some(&good()));
        session.process_frame(Some(&good()));
        session.process_frame(Some(&slouch()));
        session.process_frame(None);
        session.process_frame(Some(&LandmarkSnapshot::default()));
        session.process_frame(Some(&good()));

        let stats = session.stats();
        assert_eq!(stats.frames, 6);
        assert_eq!(stats.good_frames, 3);
        assert_eq!(stats.slouching_frames, 1);
        assert_eq!(stats.undetected_frames, 1);
        assert_eq!(stats.missing_landmark_frames, 1);
        assert_eq!(stats.longest_good_streak, 2);
        assert_eq!(session.last_verdict(), Some(PostureVerdict::Good));
    }

    #[test]
    fn current_score_tracks_progress() {
        let (clock, mut session) = manual_session();
        session.process_frame(Some(&good()));
        clock.advance(secs(1));
        session.process_frame(Some(&slouch()));
        clock.advance(secs(1));
        assert_eq!(session.current_score(), Ok(50.0));
    }
}
