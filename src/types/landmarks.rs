//! Pose landmark types: LandmarkKind, Landmark, LandmarkSnapshot

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::defaults::POSE_LANDMARK_COUNT;

// ============================================================================
// Landmark Catalogue
// ============================================================================

/// Named keypoint on a detected body.
///
/// Discriminants follow the 33-point BlazePose / MediaPipe topology so that a
/// detector's raw landmark array can be mapped by index.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkKind {
    /// All landmarks in detector index order.
    pub const ALL: [LandmarkKind; POSE_LANDMARK_COUNT] = [
        LandmarkKind::Nose,
        LandmarkKind::LeftEyeInner,
        LandmarkKind::LeftEye,
        LandmarkKind::LeftEyeOuter,
        LandmarkKind::RightEyeInner,
        LandmarkKind::RightEye,
        LandmarkKind::RightEyeOuter,
        LandmarkKind::LeftEar,
        LandmarkKind::RightEar,
        LandmarkKind::MouthLeft,
        LandmarkKind::MouthRight,
        LandmarkKind::LeftShoulder,
        LandmarkKind::RightShoulder,
        LandmarkKind::LeftElbow,
        LandmarkKind::RightElbow,
        LandmarkKind::LeftWrist,
        LandmarkKind::RightWrist,
        LandmarkKind::LeftPinky,
        LandmarkKind::RightPinky,
        LandmarkKind::LeftIndex,
        LandmarkKind::RightIndex,
        LandmarkKind::LeftThumb,
        LandmarkKind::RightThumb,
        LandmarkKind::LeftHip,
        LandmarkKind::RightHip,
        LandmarkKind::LeftKnee,
        LandmarkKind::RightKnee,
        LandmarkKind::LeftAnkle,
        LandmarkKind::RightAnkle,
        LandmarkKind::LeftHeel,
        LandmarkKind::RightHeel,
        LandmarkKind::LeftFootIndex,
        LandmarkKind::RightFootIndex,
    ];

    /// Keypoints the posture classifier needs on every frame.
    pub const POSTURE_REQUIRED: [LandmarkKind; 6] = [
        LandmarkKind::LeftShoulder,
        LandmarkKind::RightShoulder,
        LandmarkKind::LeftEar,
        LandmarkKind::RightEar,
        LandmarkKind::LeftHip,
        LandmarkKind::RightHip,
    ];

    /// Detector array index
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a landmark by detector array index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LandmarkKind::Nose => "nose",
            LandmarkKind::LeftEyeInner => "left_eye_inner",
            LandmarkKind::LeftEye => "left_eye",
            LandmarkKind::LeftEyeOuter => "left_eye_outer",
            LandmarkKind::RightEyeInner => "right_eye_inner",
            LandmarkKind::RightEye => "right_eye",
            LandmarkKind::RightEyeOuter => "right_eye_outer",
            LandmarkKind::LeftEar => "left_ear",
            LandmarkKind::RightEar => "right_ear",
            LandmarkKind::MouthLeft => "mouth_left",
            LandmarkKind::MouthRight => "mouth_right",
            LandmarkKind::LeftShoulder => "left_shoulder",
            LandmarkKind::RightShoulder => "right_shoulder",
            LandmarkKind::LeftElbow => "left_elbow",
            LandmarkKind::RightElbow => "right_elbow",
            LandmarkKind::LeftWrist => "left_wrist",
            LandmarkKind::RightWrist => "right_wrist",
            LandmarkKind::LeftPinky => "left_pinky",
            LandmarkKind::RightPinky => "right_pinky",
            LandmarkKind::LeftIndex => "left_index",
            LandmarkKind::RightIndex => "right_index",
            LandmarkKind::LeftThumb => "left_thumb",
            LandmarkKind::RightThumb => "right_thumb",
            LandmarkKind::LeftHip => "left_hip",
            LandmarkKind::RightHip => "right_hip",
            LandmarkKind::LeftKnee => "left_knee",
            LandmarkKind::RightKnee => "right_knee",
            LandmarkKind::LeftAnkle => "left_ankle",
            LandmarkKind::RightAnkle => "right_ankle",
            LandmarkKind::LeftHeel => "left_heel",
            LandmarkKind::RightHeel => "right_heel",
            LandmarkKind::LeftFootIndex => "left_foot_index",
            LandmarkKind::RightFootIndex => "right_foot_index",
        }
    }
}

impl std::fmt::Display for LandmarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Landmark
// ============================================================================

/// A single keypoint in normalized image coordinates.
///
/// `x` and `y` are in [0, 1] relative to image width and height. `z` is the
/// detector's relative depth estimate and is not used by the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Detector confidence that the keypoint is visible, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Landmarks without a reported visibility always pass.
    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.visibility.map_or(true, |v| v >= min_visibility)
    }
}

// ============================================================================
// Landmark Snapshot
// ============================================================================

/// Immutable set of keypoints produced by the detector for one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LandmarkSnapshot {
    points: BTreeMap<LandmarkKind, Landmark>,
}

impl LandmarkSnapshot {
    pub fn new(points: BTreeMap<LandmarkKind, Landmark>) -> Self {
        Self { points }
    }

    /// Build a snapshot from a detector array in landmark index order.
    ///
    /// Entries past the 33rd are ignored; a shorter array simply leaves the
    /// trailing landmarks absent.
    pub fn from_pose_array(landmarks: &[Landmark]) -> Self {
        let points = landmarks
            .iter()
            .enumerate()
            .filter_map(|(i, lm)| LandmarkKind::from_index(i).map(|kind| (kind, *lm)))
            .collect();
        Self { points }
    }

    pub fn get(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.points.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkKind, &Landmark)> {
        self.points.iter().map(|(k, v)| (*k, v))
    }

    /// Drop keypoints whose visibility is below `min_visibility`.
    pub fn filter_visible(&self, min_visibility: f64) -> Self {
        let points = self
            .points
            .iter()
            .filter(|(_, lm)| lm.is_visible(min_visibility))
            .map(|(k, v)| (*k, *v))
            .collect();
        Self { points }
    }
}

impl FromIterator<(LandmarkKind, Landmark)> for LandmarkSnapshot {
    fn from_iter<I: IntoIterator<Item = (LandmarkKind, Landmark)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrips_for_every_landmark() {
        for (i, kind) in LandmarkKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(LandmarkKind::from_index(i), Some(*kind));
        }
        assert_eq!(LandmarkKind::from_index(POSE_LANDMARK_COUNT), None);
    }

    #[test]
    fn pose_array_maps_by_index() {
        let mut raw = vec![Landmark::new(0.0, 0.0); POSE_LANDMARK_COUNT];
        raw[LandmarkKind::LeftShoulder.index()] = Landmark::new(0.4, 0.5);
        raw[LandmarkKind::RightHip.index()] = Landmark::new(0.6, 0.9);

        let snapshot = LandmarkSnapshot::from_pose_array(&raw);
        assert_eq!(snapshot.len(), POSE_LANDMARK_COUNT);
        assert_eq!(
            snapshot.get(LandmarkKind::LeftShoulder),
            Some(&Landmark::new(0.4, 0.5))
        );
        assert_eq!(
            snapshot.get(LandmarkKind::RightHip),
            Some(&Landmark::new(0.6, 0.9))
        );
    }

    #[test]
    fn short_pose_array_leaves_tail_absent() {
        let raw = vec![Landmark::new(0.5, 0.5); 12];
        let snapshot = LandmarkSnapshot::from_pose_array(&raw);
        assert!(snapshot.get(LandmarkKind::LeftShoulder).is_some());
        assert!(snapshot.get(LandmarkKind::RightShoulder).is_none());
        assert!(snapshot.get(LandmarkKind::LeftHip).is_none());
    }

    #[test]
    fn visibility_filter_drops_low_confidence_points() {
        let snapshot: LandmarkSnapshot = [
            (LandmarkKind::LeftEar, Landmark::new(0.4, 0.2).with_visibility(0.9)),
            (LandmarkKind::RightEar, Landmark::new(0.6, 0.2).with_visibility(0.2)),
            (LandmarkKind::Nose, Landmark::new(0.5, 0.2)),
        ]
        .into_iter()
        .collect();

        let filtered = snapshot.filter_visible(0.5);
        assert!(filtered.get(LandmarkKind::LeftEar).is_some());
        assert!(filtered.get(LandmarkKind::RightEar).is_none());
        // No visibility reported: kept
        assert!(filtered.get(LandmarkKind::Nose).is_some());
    }

    #[test]
    fn snapshot_json_uses_snake_case_keys() {
        let json = r#"{"left_shoulder": {"x": 0.4, "y": 0.5}, "right_ear": {"x": 0.6, "y": 0.2, "visibility": 0.8}}"#;
        let snapshot: LandmarkSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get(LandmarkKind::RightEar).and_then(|l| l.visibility),
            Some(0.8)
        );
        assert_eq!(LandmarkKind::LeftShoulder.to_string(), "left_shoulder");
    }
}
