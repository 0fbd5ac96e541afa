//! Frame source abstraction for detector output ingestion.
//!
//! Provides a unified trait for reading landmark frames from different
//! sources: a recorded JSON-lines file (replay) and a live JSON-lines stream
//! (stdin from a capture/detector bridge, or any async reader).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::types::{FrameRecord, LandmarkSnapshot};

/// Events produced by a frame source.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// One frame of detector output; `None` when nobody was detected.
    Frame(Option<LandmarkSnapshot>),
    /// Source reached end of data.
    Eof,
}

/// Unrecoverable source failure. Ends the session loop.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read recording {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Capture device failure: {0}")]
    Capture(String),
}

/// Trait abstracting where frames come from.
///
/// Implementations handle format parsing and pacing internally. The frame
/// loop calls [`next_frame`](FrameSource::next_frame) in a `select!` with
/// cancellation.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Read the next frame from the source.
    ///
    /// Returns `FrameEvent::Eof` when no more frames are available and `Err`
    /// when the capture side has failed.
    async fn next_frame(&mut self) -> Result<FrameEvent, SourceError>;

    /// Human-readable name for logging (e.g. "replay", "stdin").
    fn source_name(&self) -> &str;
}

/// Convert a parsed record into a frame event.
fn record_to_event(record: FrameRecord) -> Result<FrameEvent, SourceError> {
    if let Some(message) = record.capture_error {
        return Err(SourceError::Capture(message));
    }
    Ok(FrameEvent::Frame(record.into_snapshot()))
}

// ============================================================================
// Replay Source (recorded JSON-lines file)
// ============================================================================

/// Replays pre-loaded frames with optional inter-frame delay.
pub struct ReplaySource {
    frames: std::vec::IntoIter<FrameRecord>,
    delay_ms: u64,
    yielded_first: bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<FrameRecord>, delay_ms: u64) -> Self {
        Self {
            frames: frames.into_iter(),
            delay_ms,
            yielded_first: false,
        }
    }

    /// Convenience for tests and generated sessions.
    pub fn from_snapshots(snapshots: Vec<Option<LandmarkSnapshot>>, delay_ms: u64) -> Self {
        let frames = snapshots
            .into_iter()
            .map(|s| s.map_or_else(FrameRecord::undetected, FrameRecord::detected))
            .collect();
        Self::new(frames, delay_ms)
    }

    /// Load a JSON-lines recording. Blank lines are skipped; any malformed
    /// line fails the whole load with its line number.
    pub fn from_path(path: &Path, delay_ms: u64) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let frames = parse_records(&contents)?;
        Ok(Self::new(frames, delay_ms))
    }

    /// Frames not yet yielded
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

/// Parse every non-blank line of a JSON-lines document.
pub fn parse_records(contents: &str) -> Result<Vec<FrameRecord>, SourceError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<FrameRecord>(line.trim()).map_err(|e| SourceError::Parse {
                line: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> Result<FrameEvent, SourceError> {
        // No delay before the first frame
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.frames.next() {
            Some(record) => {
                self.yielded_first = true;
                record_to_event(record)
            }
            None => Ok(FrameEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Line Source (live JSON lines from any async reader)
// ============================================================================

/// Reads JSON-lines frames from an async reader, one frame per line.
///
/// Used with a detector bridge:
/// `python pose_bridge.py | ./posture-score`
///
/// Malformed lines, including bytes that are not UTF-8, are logged and
/// skipped so a single bad frame does not end a live session. Only I/O
/// errors from the reader are returned as [`SourceError::Io`].
pub struct LineSource<R> {
    reader: R,
    name: String,
    line_buffer: Vec<u8>,
    line_number: usize,
    skipped_lines: u64,
}

impl<R: AsyncBufRead + Unpin + Send + 'static> LineSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            line_buffer: Vec::with_capacity(4096),
            line_number: 0,
            skipped_lines: 0,
        }
    }

    /// Malformed or non-UTF-8 lines skipped so far
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }
}

/// Live frames from stdin.
pub type StdinSource = LineSource<tokio::io::BufReader<tokio::io::Stdin>>;

impl StdinSource {
    pub fn stdin() -> Self {
        LineSource::new(tokio::io::BufReader::new(tokio::io::stdin()), "stdin")
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send + 'static> FrameSource for LineSource<R> {
    async fn next_frame(&mut self) -> Result<FrameEvent, SourceError> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_until(b'\n', &mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(FrameEvent::Eof);
            }
            self.line_number += 1;
            let line = match std::str::from_utf8(&self.line_buffer) {
                Ok(text) => text.trim(),
                Err(e) => {
                    self.skipped_lines += 1;
                    tracing::warn!(
                        source = %self.name,
                        line = self.line_number,
                        "Frame is not valid UTF-8: {}",
                        e
                    );
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<FrameRecord>(line) {
                Ok(record) => return record_to_event(record),
                Err(e) => {
                    self.skipped_lines += 1;
                    tracing::warn!(
                        source = %self.name,
                        line = self.line_number,
                        "Failed to parse frame: {}",
                        e
                    );
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Tests
// ============================================================================
