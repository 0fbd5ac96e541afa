//! Frame Pipeline
//!
//! ```text
//! FrameSource (replay file | stdin bridge)
//!     -> Session::process_frame (classify, drive posture timer)
//!     -> FrameObserver (overlay / render)
//!     -> SessionReport at end of stream, capture failure, time limit or stop
//! ```
//!
//! Each frame is processed to completion before the next one is read.

pub mod processing_loop;
pub mod source;

pub use processing_loop::{FrameLoop, FrameObserver, OverlayLogger};
pub use source::{FrameEvent, FrameSource, LineSource, ReplaySource, SourceError, StdinSource};
