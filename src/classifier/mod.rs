//! Posture Classifier
//!
//! Pure per-frame classification of seated posture from a landmark snapshot.
//!
//! ## Checks
//!
//! | Check          | Measurement                          | Threshold            |
//! |----------------|--------------------------------------|----------------------|
//! | Left neck      | \|left_ear.x - left_shoulder.x\|     | `neck_threshold`     |
//! | Right neck     | \|right_ear.x - right_shoulder.x\|   | `neck_threshold`     |
//! | Spine          | mean \|shoulder.x - hip.x\|          | `spine_threshold`    |
//! | Shoulder level | \|left_shoulder.y - right_shoulder.y\| | `shoulder_threshold` |
//!
//! A frame is `Slouching` when any check exceeds its threshold (strict `>`).
//! Checks are not weighted and there is no smoothing between frames.

use thiserror::Error;

use crate::config::PostureThresholds;
use crate::types::{
    Landmark, LandmarkKind, LandmarkSnapshot, PostureAssessment, PostureMeasurement,
    PostureVerdict, Violation,
};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Required landmark missing: {0}")]
    MissingLandmark(LandmarkKind),
}

/// Classify one snapshot against the given thresholds.
///
/// Fails with [`ClassifyError::MissingLandmark`] when any of the six
/// shoulder/ear/hip keypoints is absent; that is "no verdict", not Slouching.
pub fn classify(
    snapshot: &LandmarkSnapshot,
    thresholds: &PostureThresholds,
) -> Result<PostureAssessment, ClassifyError> {
    let measurement = measure(snapshot)?;
    let violations = violations(&measurement, thresholds);
    let verdict = if violations.is_empty() {
        PostureVerdict::Good
    } else {
        PostureVerdict::Slouching
    };
    Ok(PostureAssessment {
        verdict,
        measurement,
        violations,
    })
}

/// Compute the alignment measurements for one snapshot.
pub fn measure(snapshot: &LandmarkSnapshot) -> Result<PostureMeasurement, ClassifyError> {
    let left_shoulder = require(snapshot, LandmarkKind::LeftShoulder)?;
    let right_shoulder = require(snapshot, LandmarkKind::RightShoulder)?;
    let left_ear = require(snapshot, LandmarkKind::LeftEar)?;
    let right_ear = require(snapshot, LandmarkKind::RightEar)?;
    let left_hip = require(snapshot, LandmarkKind::LeftHip)?;
    let right_hip = require(snapshot, LandmarkKind::RightHip)?;

    let left_spine_alignment = (left_shoulder.x - left_hip.x).abs();
    let right_spine_alignment = (right_shoulder.x - right_hip.x).abs();

    Ok(PostureMeasurement {
        left_neck_alignment: (left_ear.x - left_shoulder.x).abs(),
        right_neck_alignment: (right_ear.x - right_shoulder.x).abs(),
        left_spine_alignment,
        right_spine_alignment,
        spine_straightness: (left_spine_alignment + right_spine_alignment) / 2.0,
        shoulder_height_diff: (left_shoulder.y - right_shoulder.y).abs(),
    })
}

/// Checks that `measurement` fails, in table order.
pub fn violations(measurement: &PostureMeasurement, thresholds: &PostureThresholds) -> Vec<Violation> {
    [
        (
            measurement.left_neck_alignment > thresholds.neck_threshold,
            Violation::LeftNeck,
        ),
        (
            measurement.right_neck_alignment > thresholds.neck_threshold,
            Violation::RightNeck,
        ),
        (
            measurement.spine_straightness > thresholds.spine_threshold,
            Violation::Spine,
        ),
        (
            measurement.shoulder_height_diff > thresholds.shoulder_threshold,
            Violation::ShoulderTilt,
        ),
    ]
    .into_iter()
    .filter_map(|(failed, v)| failed.then_some(v))
    .collect()
}

/// Verdict for a precomputed measurement.
pub fn verdict_for(measurement: &PostureMeasurement, thresholds: &PostureThresholds) -> PostureVerdict {
    if violations(measurement, thresholds).is_empty() {
        PostureVerdict::Good
    } else {
        PostureVerdict::Slouching
    }
}

fn require(snapshot: &LandmarkSnapshot, kind: LandmarkKind) -> Result<&Landmark, ClassifyError> {
    snapshot.get(kind).ok_or(ClassifyError::MissingLandmark(kind))
}

// ============================================================================
// Classifier
// ============================================================================

/// Thresholds plus landmark filtering, bundled for the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureClassifier {
    thresholds: PostureThresholds,
    min_visibility: f64,
}

impl PostureClassifier {
    pub fn new(thresholds: PostureThresholds) -> Self {
        Self {
            thresholds,
            min_visibility: 0.0,
        }
    }

    /// Treat landmarks below `min_visibility` as missing.
    pub fn with_min_visibility(mut self, min_visibility: f64) -> Self {
        self.min_visibility = min_visibility;
        self
    }

    pub fn thresholds(&self) -> &PostureThresholds {
        &self.thresholds
    }

    pub fn classify(&self, snapshot: &LandmarkSnapshot) -> Result<PostureAssessment, ClassifyError> {
        if self.min_visibility > 0.0 {
            classify(&snapshot.filter_visible(self.min_visibility), &self.thresholds)
        } else {
            classify(snapshot, &self.thresholds)
        }
    }
}

impl Default for PostureClassifier {
    fn default() -> Self {
        Self::new(PostureThresholds::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
