//! Shared data structures for the posture scoring pipeline
//!
//! - LandmarkSnapshot: detector output for one frame
//! - PostureMeasurement / PostureVerdict: classifier output
//! - FrameRecord: JSON-lines wire format consumed by frame sources

mod landmarks;
mod posture;
mod frame;

pub use landmarks::*;
pub use posture::*;
pub use frame::*;
