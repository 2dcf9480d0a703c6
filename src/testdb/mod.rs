//! Test Database Module
//!
//! In-memory device fixtures for exercising the import engine without a
//! camera plugged in.
//!
//! # Features
//!
//! - **Mock Devices**: [`MockDevice`] holds a file tree built from paths, with
//!   injectable listing, read and delete failures
//! - **Mock Library**: [`MockDeviceLibrary`] attaches several devices and
//!   records init, selection and teardown calls
//! - **Scenarios**: [`ScenarioLibrary`] builds the device setups used by the
//!   session tests (GoPro, camcorder, SD card, mixed rigs)
//! - **Progress capture**: [`RecordingProgress`] keeps every progress event
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use media_tool::core::progress::NoProgress;
//! use media_tool::core::session::{import_from_devices, DeviceSelection, ImportRequest};
//! use media_tool::core::tree::TreeWalker;
//! use media_tool::testdb::ScenarioLibrary;
//! use std::path::PathBuf;
//!
//! let mut library = ScenarioLibrary::mixed_rig();
//! let request = ImportRequest {
//!     selection: DeviceSelection::label_contains("GoPro"),
//!     device_dir: "DCIM/100GOPRO".to_string(),
//!     target_dir: PathBuf::from("./staging"),
//!     dry_run: true,
//! };
//! let outcome = import_from_devices(&mut library, &request, &TreeWalker::default(), &mut NoProgress);
//! ```

pub mod mock_device;
pub mod scenarios;

pub use mock_device::{LibraryCall, MockDevice, MockDeviceLibrary, MockEntry, MockHandle};
pub use scenarios::ScenarioLibrary;

use crate::core::progress::{ProgressEvent, ProgressPhase, ProgressRenderer};

/// Progress renderer that records everything it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    /// `(phase, total_files, total_bytes)` per started pass
    pub started: Vec<(ProgressPhase, usize, u64)>,
    pub events: Vec<ProgressEvent>,
    pub finished: Vec<ProgressPhase>,
}

impl RecordingProgress {
    /// Events of one phase only
    pub fn events_for(&self, phase: ProgressPhase) -> Vec<&ProgressEvent> {
        self.events.iter().filter(|e| e.phase == phase).collect()
    }
}

impl ProgressRenderer for RecordingProgress {
    fn start(&mut self, phase: ProgressPhase, total_files: usize, total_bytes: u64) {
        self.started.push((phase, total_files, total_bytes));
    }

    fn update(&mut self, event: &ProgressEvent) {
        self.events.push(event.clone());
    }

    fn finish(&mut self, phase: ProgressPhase) {
        self.finished.push(phase);
    }
}
