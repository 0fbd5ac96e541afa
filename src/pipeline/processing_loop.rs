//! Per-frame session loop shared by every input mode.
//!
//! Pulls frames from a [`FrameSource`], applies each one to the [`Session`],
//! hands the outcome to a [`FrameObserver`] and stops on end of stream,
//! capture failure, time limit or cancellation. Whatever ends the loop, the
//! session is finished and a [`SessionReport`] is returned.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::source::{FrameEvent, FrameSource};
use crate::config::{defaults, SessionConfig};
use crate::display::{self, Overlay};
use crate::session::{FrameOutcome, Session, SessionExit, SessionReport};
use crate::timing::{Clock, MonotonicClock};
use crate::types::PostureVerdict;

// ============================================================================
// Frame Observer
// ============================================================================

/// Receives every frame outcome after the session has applied it.
///
/// This is where rendering hooks in. Pass `()` when nothing needs to see the
/// frames.
pub trait FrameObserver: Send + 'static {
    /// `frame_index` counts from 1.
    fn on_frame(&mut self, frame_index: u64, outcome: &FrameOutcome);
}

impl FrameObserver for () {
    fn on_frame(&mut self, _frame_index: u64, _outcome: &FrameOutcome) {}
}

/// Writes the overlay text for each frame to the debug log.
#[derive(Debug, Default)]
pub struct OverlayLogger;

impl FrameObserver for OverlayLogger {
    fn on_frame(&mut self, frame_index: u64, outcome: &FrameOutcome) {
        match Overlay::from_outcome(outcome) {
            Some(overlay) => {
                let text: Vec<&str> = overlay.lines().map(|l| l.text.as_str()).collect();
                debug!(frame = frame_index, "{}", text.join(" | "));
            }
            None => {
                if let Some(label) = display::no_verdict_label(outcome) {
                    debug!(frame = frame_index, "{}", label);
                }
            }
        }
    }
}

// ============================================================================
// Frame Loop
// ============================================================================

/// Owns the session for the duration of the loop.
///
/// Built with [`new()`](FrameLoop::new), optionally configured with
/// [`with_time_limit()`](FrameLoop::with_time_limit) and
/// [`with_progress_interval()`](FrameLoop::with_progress_interval), then
/// consumed by [`run()`](FrameLoop::run).
pub struct FrameLoop<O: FrameObserver, C: Clock + Clone = MonotonicClock> {
    session: Session<C>,
    observer: O,
    cancel_token: CancellationToken,
    time_limit: Option<Duration>,
    progress_interval: u64,
}

impl<O: FrameObserver, C: Clock + Clone> FrameLoop<O, C> {
    pub fn new(session: Session<C>, observer: O, cancel_token: CancellationToken) -> Self {
        Self {
            session,
            observer,
            cancel_token,
            time_limit: None,
            progress_interval: defaults::PROGRESS_LOG_INTERVAL_FRAMES,
        }
    }

    /// Stop once total session time reaches `limit`. Checked after each frame.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit.filter(|d| !d.is_zero());
        self
    }

    /// Frames between progress log lines; 0 disables progress logging.
    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames;
        self
    }

    /// Apply the `[session]` config section.
    pub fn with_session_config(self, config: &SessionConfig) -> Self {
        let limit = (config.max_duration_secs > 0)
            .then(|| Duration::from_secs(config.max_duration_secs));
        self.with_time_limit(limit)
            .with_progress_interval(config.progress_log_interval_frames)
    }

    /// Run until the source ends, fails, the time limit passes, or the
    /// cancel token fires.
    pub async fn run<S: FrameSource>(mut self, source: &mut S) -> SessionReport {
        let mut frame_index = 0u64;

        info!("🧍 Scoring posture from {}...", source.source_name());
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        self.session.start();

        let exit = loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("[FrameLoop] Stop signal received");
                    break SessionExit::Cancelled;
                }
                result = source.next_frame() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[FrameLoop] Source error: {}", e);
                            break SessionExit::CaptureFailure(e.to_string());
                        }
                    }
                }
            };

            let snapshot = match event {
                FrameEvent::Frame(s) => s,
                FrameEvent::Eof => {
                    info!(
                        "[FrameLoop] Source reached end ({} frames processed)",
                        frame_index
                    );
                    break SessionExit::EndOfStream;
                }
            };

            frame_index += 1;
            let previous = self.session.last_verdict();
            let outcome = self.session.process_frame(snapshot.as_ref());

            if let Some(verdict) = outcome.verdict() {
                if previous != Some(verdict) {
                    log_transition(frame_index, verdict, &outcome);
                }
            }

            self.observer.on_frame(frame_index, &outcome);

            if self.progress_interval > 0 && frame_index % self.progress_interval == 0 {
                log_progress(frame_index, &self.session);
            }

            if let Some(limit) = self.time_limit {
                if self.session.total_elapsed() >= limit {
                    info!(
                        "[FrameLoop] Time limit of {:.0}s reached",
                        limit.as_secs_f64()
                    );
                    break SessionExit::TimeLimit;
                }
            }
        };

        let report = self.session.finish(exit);
        log_final_statistics(&report);
        report
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn log_transition(frame_index: u64, verdict: PostureVerdict, outcome: &FrameOutcome) {
    match verdict {
        PostureVerdict::Good => info!(frame = frame_index, verdict = %verdict, "✅ {}", verdict.label()),
        PostureVerdict::Slouching => {
            let reasons: Vec<&str> = outcome
                .assessment()
                .map(|a| a.violations.iter().map(|v| v.description()).collect())
                .unwrap_or_default();
            info!(
                frame = frame_index,
                verdict = %verdict,
                "⚠️  {} ({})",
                verdict.label(),
                reasons.join(", ")
            );
        }
    }
}

fn log_progress<C: Clock + Clone>(frame_index: u64, session: &Session<C>) {
    let score = session
        .current_score()
        .map(|s| format!("{s:.1}"))
        .unwrap_or_else(|_| "-".to_string());
    info!(
        "📈 Progress: {} frames | Good: {:.1}s / {:.1}s | Score: {} | Now: {}",
        frame_index,
        session.posture_elapsed().as_secs_f64(),
        session.total_elapsed().as_secs_f64(),
        score,
        display::verdict_tag(session.last_verdict())
    );
}

fn log_final_statistics(report: &SessionReport) {
    let stats = &report.stats;
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Frames Processed:     {}", stats.frames);
    info!("   Good Frames:          {}", stats.good_frames);
    info!("   Slouching Frames:     {}", stats.slouching_frames);
    info!("   Undetected Frames:    {}", stats.undetected_frames);
    info!("   Incomplete Frames:    {}", stats.missing_landmark_frames);
    info!("   Longest Good Streak:  {}", stats.longest_good_streak);
    info!(
        "   Good Posture Time:    {:.1}s / {:.1}s",
        report.posture_elapsed.as_secs_f64(),
        report.total_elapsed.as_secs_f64()
    );
    match report.score_result() {
        Ok(score) => info!("   {}", display::score_line(score)),
        Err(e) => warn!("   {}", e),
    }
    info!("   Exit:                 {}", report.exit);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PostureClassifier;
    use crate::config::PostureConfig;
    use crate::pipeline::source::{ReplaySource, SourceError};
    use crate::timing::ManualClock;
    use crate::types::{Landmark, LandmarkKind, LandmarkSnapshot};
    use async_trait::async_trait;

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

    /// Advances the session clock by one second after every frame.
    struct Ticker(ManualClock);

    impl FrameObserver for Ticker {
        fn on_frame(&mut self, _frame_index: u64, _outcome: &FrameOutcome) {
            self.0.advance(Duration::from_secs(1));
        }
    }

    fn manual_loop(clock: &ManualClock, cancel: CancellationToken) -> FrameLoop<Ticker, ManualClock> {
        let session = Session::with_clock(PostureClassifier::default(), clock.clone());
        FrameLoop::new(session, Ticker(clock.clone()), cancel)
    }

    #[tokio::test]
    async fn eight_good_seconds_of_ten_scores_eighty() {
        let clock = ManualClock::new();
        let mut frames = vec![Some(snapshot(0.0)); 8];
        frames.extend([Some(snapshot(0.2)), Some(snapshot(0.2))]);
        let mut source = ReplaySource::from_snapshots(frames, 0);

        let report = manual_loop(&clock, CancellationToken::new())
            .run(&mut source)
            .await;

        assert_eq!(report.exit, SessionExit::EndOfStream);
        assert_eq!(report.total_elapsed, Duration::from_secs(10));
        assert_eq!(report.posture_elapsed, Duration::from_secs(8));
        assert_eq!(report.score, Some(80.0));
        assert_eq!(report.stats.frames, 10);
    }

    #[tokio::test]
    async fn cancelled_before_first_frame_still_reports() {
        let clock = ManualClock::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut source = ReplaySource::from_snapshots(vec![Some(snapshot(0.0))], 0);

        let report = manual_loop(&clock, cancel).run(&mut source).await;

        assert_eq!(report.exit, SessionExit::Cancelled);
        assert_eq!(report.stats.frames, 0);
        assert_eq!(report.score, None);
    }

    struct FailingSource {
        frames_left: usize,
    }

    #[async_trait]
    impl FrameSource for FailingSource {
        async fn next_frame(&mut self) -> Result<FrameEvent, SourceError> {
            if self.frames_left == 0 {
                return Err(SourceError::Capture("camera unplugged".to_string()));
            }
            self.frames_left -= 1;
            Ok(FrameEvent::Frame(Some(snapshot(0.0))))
        }

        fn source_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn capture_failure_keeps_score_so_far() {
        let clock = ManualClock::new();
        let mut source = FailingSource { frames_left: 3 };

        let report = manual_loop(&clock, CancellationToken::new())
            .run(&mut source)
            .await;

        assert!(matches!(report.exit, SessionExit::CaptureFailure(ref m) if m.contains("camera unplugged")));
        assert_eq!(report.total_elapsed, Duration::from_secs(3));
        assert_eq!(report.score, Some(100.0));
    }

    #[tokio::test]
    async fn time_limit_ends_session() {
        let clock = ManualClock::new();
        let mut source = ReplaySource::from_snapshots(vec![None; 20], 0);

        let report = manual_loop(&clock, CancellationToken::new())
            .with_time_limit(Some(Duration::from_secs(5)))
            .run(&mut source)
            .await;

        assert_eq!(report.exit, SessionExit::TimeLimit);
        assert_eq!(report.stats.frames, 5);
        assert_eq!(report.stats.undetected_frames, 5);
    }

    #[tokio::test]
    async fn zero_time_limit_means_unlimited() {
        let clock = ManualClock::new();
        let mut source = ReplaySource::from_snapshots(vec![None; 4], 0);

        let report = manual_loop(&clock, CancellationToken::new())
            .with_session_config(&SessionConfig {
                max_duration_secs: 0,
                progress_log_interval_frames: 2,
            })
            .run(&mut source)
            .await;

        assert_eq!(report.exit, SessionExit::EndOfStream);
        assert_eq!(report.stats.frames, 4);
    }

    #[tokio::test]
    async fn zero_progress_interval_runs_without_progress_lines() {
        let clock = ManualClock::new();
        let mut source = ReplaySource::from_snapshots(vec![Some(snapshot(0.0)); 3], 0);
        let config = PostureConfig::from_toml_str("[session]\nprogress_log_interval_frames = 0\n")
            .unwrap();

        let report = manual_loop(&clock, CancellationToken::new())
            .with_session_config(&config.session)
            .run(&mut source)
            .await;

        assert_eq!(report.exit, SessionExit::EndOfStream);
        assert_eq!(report.stats.frames, 3);
        assert_eq!(report.score, Some(100.0));
    }

    #[test]
    fn overlay_logger_handles_every_outcome() {
        let mut logger = OverlayLogger;
        logger.on_frame(1, &FrameOutcome::NoDetection);
        logger.on_frame(2, &FrameOutcome::MissingLandmark(LandmarkKind::RightHip));
        let outcome = Session::new(PostureClassifier::default()).process_frame(Some(&snapshot(0.0)));
        logger.on_frame(3, &outcome);
    }
}
