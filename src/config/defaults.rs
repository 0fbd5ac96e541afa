//! System-wide default constants.
//!
//! Centralises magic numbers used by the config layer, the frame loop and the
//! simulation. Grouped by subsystem for easy discovery.

// ============================================================================
// Posture Thresholds
// ============================================================================

/// Maximum horizontal ear-to-shoulder offset before the neck counts as forward.
pub const NECK_THRESHOLD: f64 = 0.1;

/// Maximum mean horizontal shoulder-to-hip offset before the spine counts as leaning.
pub const SPINE_THRESHOLD: f64 = 0.11;

/// Maximum vertical offset between the shoulders.
pub const SHOULDER_THRESHOLD: f64 = 0.05;

/// Thresholds above this are accepted but reported as suspicious.
///
/// Half the frame width is far beyond any real misalignment.
pub const SUSPICIOUS_THRESHOLD: f64 = 0.5;

// ============================================================================
// Detection
// ============================================================================

/// Number of keypoints in the BlazePose / MediaPipe pose topology.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Landmark visibility floor. 0.0 keeps every landmark the detector reports.
pub const MIN_VISIBILITY: f64 = 0.0;

// ============================================================================
// Frame Loop
// ============================================================================

/// Frames between progress log lines.
///
/// 300 frames at 30 fps = one line every 10 seconds.
pub const PROGRESS_LOG_INTERVAL_FRAMES: u64 = 300;

/// Session time limit in seconds. 0 = run until stopped.
pub const MAX_SESSION_DURATION_SECS: u64 = 0;

/// Delay between frames when replaying a recording at 1x (ms). ~30 fps.
pub const REPLAY_FRAME_DELAY_MS: u64 = 33;

/// Decimal places used for measurement values on the overlay.
pub const OVERLAY_DECIMALS: usize = 3;

// ============================================================================
// Simulation
// ============================================================================

/// Synthetic camera frame rate (frames per simulated second).
pub const SIMULATION_FPS: u32 = 30;
