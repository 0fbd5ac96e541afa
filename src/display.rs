//! Text for the per-frame diagnostic overlay and the final score.
//!
//! Rendering belongs to whatever draws on the camera feed; this module only
//! decides what the text says and which colour it uses.

use crate::config::defaults::OVERLAY_DECIMALS;
use crate::session::{FrameOutcome, SessionReport};
use crate::types::{PostureAssessment, PostureVerdict};

/// One line of overlay text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLine {
    pub text: String,
    /// Colour as (B, G, R)
    pub bgr: (u8, u8, u8),
}

/// Overlay content for one classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub status: OverlayLine,
    pub measurements: Vec<OverlayLine>,
}

impl Overlay {
    pub fn from_assessment(assessment: &PostureAssessment) -> Self {
        let bgr = assessment.verdict.bgr_color();
        let m = &assessment.measurement;
        let line = |label: &str, value: f64| OverlayLine {
            text: format!("{label} {value:.prec$}", prec = OVERLAY_DECIMALS),
            bgr,
        };

        Self {
            status: OverlayLine {
                text: assessment.verdict.label().to_string(),
                bgr,
            },
            measurements: vec![
                line("left neck", m.left_neck_alignment),
                line("right neck", m.right_neck_alignment),
                line("left spine", m.left_spine_alignment),
                line("right spine", m.right_spine_alignment),
                line("spine", m.spine_straightness),
                line("shoulders", m.shoulder_height_diff),
            ],
        }
    }

    /// Overlay for any frame outcome; `None` when there is nothing to show.
    pub fn from_outcome(outcome: &FrameOutcome) -> Option<Self> {
        outcome.assessment().map(Self::from_assessment)
    }

    /// All lines top to bottom
    pub fn lines(&self) -> impl Iterator<Item = &OverlayLine> {
        std::iter::once(&self.status).chain(self.measurements.iter())
    }
}

/// Console score line, e.g. `Score: 80.00 out of 100`.
pub fn score_line(score: f64) -> String {
    format!("Score: {score:.2} out of 100")
}

/// Large-format score banner, e.g. `Score: 80/100`.
pub fn score_banner(score: f64) -> String {
    format!("Score: {score:.0}/100")
}

/// Human-readable end-of-session summary.
pub fn summary_lines(report: &SessionReport) -> Vec<String> {
    let mut lines = Vec::new();
    match report.score_result() {
        Ok(score) => {
            lines.push(score_line(score));
            lines.push(score_banner(score));
        }
        Err(e) => lines.push(format!("No score: {e}")),
    }
    lines.push(format!(
        "Good posture: {:.1}s of {:.1}s",
        report.posture_elapsed.as_secs_f64(),
        report.total_elapsed.as_secs_f64()
    ));
    let s = &report.stats;
    lines.push(format!(
        "Frames: {} ({} good, {} slouching, {} undetected, {} incomplete)",
        s.frames, s.good_frames, s.slouching_frames, s.undetected_frames, s.missing_landmark_frames
    ));
    lines.push(format!("Session ended: {}", report.exit));
    lines
}

/// Overlay status for frames without a verdict.
pub fn no_verdict_label(outcome: &FrameOutcome) -> Option<String> {
    match outcome {
        FrameOutcome::Assessed(_) => None,
        FrameOutcome::NoDetection => Some("No person detected".to_string()),
        FrameOutcome::MissingLandmark(kind) => Some(format!("Landmark not visible: {kind}")),
    }
}

/// Short label for logs, `-` for unclassified frames.
pub fn verdict_tag(verdict: Option<PostureVerdict>) -> &'static str {
    match verdict {
        Some(PostureVerdict::Good) => "GOOD",
        Some(PostureVerdict::Slouching) => "SLOUCH",
        None => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LandmarkKind, PostureMeasurement, Violation};

    fn assessment(verdict: PostureVerdict) -> PostureAssessment {
        PostureAssessment {
            verdict,
            measurement: PostureMeasurement {
                left_neck_alignment: 0.12345,
                right_neck_alignment: 0.02,
                left_spine_alignment: 0.1,
                right_spine_alignment: 0.05,
                spine_straightness: 0.075,
                shoulder_height_diff: 0.0004,
            },
            violations: if verdict.is_good() {
                vec![]
            } else {
                vec![Violation::LeftNeck]
            },
        }
    }

    #[test]
    fn overlay_rounds_to_three_decimals() {
        let overlay = Overlay::from_assessment(&assessment(PostureVerdict::Slouching));
        let texts: Vec<&str> = overlay.measurements.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts[0], "left neck 0.123");
        assert_eq!(texts[1], "right neck 0.020");
        assert_eq!(texts[5], "shoulders 0.000");
        assert_eq!(overlay.lines().count(), 7);
    }

    #[test]
    fn overlay_colour_follows_verdict() {
        let good = Overlay::from_assessment(&assessment(PostureVerdict::Good));
        assert_eq!(good.status.text, "Good Posture");
        assert!(good.lines().all(|l| l.bgr == (100, 255, 100)));

        let bad = Overlay::from_assessment(&assessment(PostureVerdict::Slouching));
        assert_eq!(bad.status.text, "Slouching Detected!");
        assert!(bad.lines().all(|l| l.bgr == (100, 100, 255)));
    }

    #[test]
    fn score_formats() {
        assert_eq!(score_line(80.0), "Score: 80.00 out of 100");
        assert_eq!(score_banner(79.6), "Score: 80/100");
    }

    #[test]
    fn unclassified_frames_have_labels() {
        assert_eq!(Overlay::from_outcome(&FrameOutcome::NoDetection), None);
        assert_eq!(
            no_verdict_label(&FrameOutcome::MissingLandmark(LandmarkKind::LeftHip)).as_deref(),
            Some("Landmark not visible: left_hip")
        );
    }
}
