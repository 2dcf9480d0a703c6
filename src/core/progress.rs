//! Progress events emitted by the transfer and cleanup passes
//!
//! The engine only produces structured [`ProgressEvent`]s; how they are drawn
//! is up to the [`ProgressRenderer`] handed in by the caller.

use std::fmt;

/// Which pass is reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Byte-based: copying files to the staging directory
    Copying,
    /// Count-based: deleting originals from the device
    Deleting,
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressPhase::Copying => write!(f, "Copying"),
            ProgressPhase::Deleting => write!(f, "Deleting"),
        }
    }
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    /// 1-based index of the file being processed
    pub current: usize,
    /// Number of files in the pass
    pub total: usize,
    /// Bytes transferred so far (0 while deleting)
    pub bytes_done: u64,
    /// Bytes in the whole pass (0 while deleting)
    pub bytes_total: u64,
    /// Device path of the file, relative to the listing root
    pub label: String,
}

/// Receives progress from the engine
pub trait ProgressRenderer {
    /// A pass is starting
    fn start(&mut self, phase: ProgressPhase, total_files: usize, total_bytes: u64);

    /// Something moved
    fn update(&mut self, event: &ProgressEvent);

    /// The pass is over
    fn finish(&mut self, phase: ProgressPhase);
}

/// Renderer that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressRenderer for NoProgress {
    fn start(&mut self, _phase: ProgressPhase, _total_files: usize, _total_bytes: u64) {}

    fn update(&mut self, _event: &ProgressEvent) {}

    fn finish(&mut self, _phase: ProgressPhase) {}
}
