//! Per-frame posture types: PostureVerdict, PostureMeasurement, Violation

use serde::{Deserialize, Serialize};

// ============================================================================
// Verdict
// ============================================================================

/// Binary posture classification for one frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PostureVerdict {
    Good,
    Slouching,
}

impl PostureVerdict {
    /// Overlay label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            PostureVerdict::Good => "Good Posture",
            PostureVerdict::Slouching => "Slouching Detected!",
        }
    }

    /// Overlay text colour as (B, G, R).
    pub fn bgr_color(&self) -> (u8, u8, u8) {
        match self {
            PostureVerdict::Good => (100, 255, 100),
            PostureVerdict::Slouching => (100, 100, 255),
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, PostureVerdict::Good)
    }
}

impl std::fmt::Display for PostureVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostureVerdict::Good => write!(f, "Good"),
            PostureVerdict::Slouching => write!(f, "Slouching"),
        }
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// Alignment measurements derived from one landmark snapshot.
///
/// All values are absolute offsets in normalized image units, so they are
/// non-negative and larger means worse alignment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PostureMeasurement {
    /// |left_ear.x - left_shoulder.x|
    pub left_neck_alignment: f64,
    /// |right_ear.x - right_shoulder.x|
    pub right_neck_alignment: f64,
    /// |left_shoulder.x - left_hip.x|
    pub left_spine_alignment: f64,
    /// |right_shoulder.x - right_hip.x|
    pub right_spine_alignment: f64,
    /// Mean of the two spine alignments
    pub spine_straightness: f64,
    /// |left_shoulder.y - right_shoulder.y|
    pub shoulder_height_diff: f64,
}

// ============================================================================
// Violations
// ============================================================================

/// One failed posture check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Left ear drifted forward of the left shoulder
    LeftNeck,
    /// Right ear drifted forward of the right shoulder
    RightNeck,
    /// Shoulders displaced from hips
    Spine,
    /// Shoulders not level
    ShoulderTilt,
}

impl Violation {
    pub fn description(&self) -> &'static str {
        match self {
            Violation::LeftNeck => "left neck forward",
            Violation::RightNeck => "right neck forward",
            Violation::Spine => "spine leaning",
            Violation::ShoulderTilt => "shoulders uneven",
        }
    }
}

/// Classifier output for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureAssessment {
    pub verdict: PostureVerdict,
    pub measurement: PostureMeasurement,
    /// Checks that exceeded their threshold; empty iff `verdict` is Good
    pub violations: Vec<Violation>,
}
