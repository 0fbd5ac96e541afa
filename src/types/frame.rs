//! FrameRecord: one line of detector output in JSON-lines form
//!
//! Accepted shapes:
//!
//! ```text
//! {"landmarks": {"left_shoulder": {"x": 0.41, "y": 0.52}, ...}}
//! {"pose_landmarks": [{"x": .., "y": .., "z": .., "visibility": ..}, ... 33 entries]}
//! {"landmarks": null}      nothing detected
//! {}                       nothing detected
//! {"capture_error": "..."} capture device failed; ends the session
//! ```

use serde::{Deserialize, Serialize};

use super::{Landmark, LandmarkSnapshot};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameRecord {
    /// Capture timestamp (ms), informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,

    /// Named keypoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkSnapshot>,

    /// Raw detector array in landmark index order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_landmarks: Option<Vec<Landmark>>,

    /// Set by the capture bridge when the camera stops delivering frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_error: Option<String>,
}

impl FrameRecord {
    pub fn detected(snapshot: LandmarkSnapshot) -> Self {
        Self {
            landmarks: Some(snapshot),
            ..Default::default()
        }
    }

    pub fn undetected() -> Self {
        Self::default()
    }

    /// Resolve the record into a snapshot, or `None` when no person was detected.
    ///
    /// Named landmarks take precedence over the raw array. An empty set of
    /// landmarks counts as no detection.
    pub fn into_snapshot(self) -> Option<LandmarkSnapshot> {
        let snapshot = match (self.landmarks, self.pose_landmarks) {
            (Some(named), _) => named,
            (None, Some(raw)) => LandmarkSnapshot::from_pose_array(&raw),
            (None, None) => return None,
        };
        (!snapshot.is_empty()).then_some(snapshot)
    }
}
