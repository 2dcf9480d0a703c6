//! Media Tool Library
//!
//! Imports photos and videos from MTP devices (GoPro cameras, camcorders,
//! SD-card readers): walks a device folder, copies every file into a
//! timestamped staging directory, removes what was copied from the device and
//! hands the staged files to exiftool for renaming by capture date.
//!
//! # Architecture
//!
//! - [`core`] - Tree walker, execution plan, transfer and cleanup passes, the
//!   device session, import presets, local-folder exiftool passes,
//!   configuration and errors
//! - [`device`] - Device-access traits, device filters and the WPD backend
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - Mock device library and scenario fixtures
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use media_tool::core::progress::NoProgress;
//! use media_tool::core::session::{import_from_devices, DeviceSelection, ImportRequest};
//! use media_tool::core::tree::TreeWalker;
//! use media_tool::device::PlatformLibrary;
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut library = PlatformLibrary::new();
//!     let request = ImportRequest {
//!         selection: DeviceSelection::label_contains("GoPro"),
//!         device_dir: "DCIM/100GOPRO".to_string(),
//!         target_dir: PathBuf::from("D:/Import"),
//!         dry_run: false,
//!     };
//!
//!     let outcome = import_from_devices(&mut library, &request, &TreeWalker::default(), &mut NoProgress)?;
//!     println!("Staged in {}", outcome.staging_dir.display());
//!     Ok(())
//! }
//! ```
//!
//! # Platform Support
//!
//! Device access uses the Windows Portable Devices API. On other platforms the
//! library builds and its engine runs against mock devices, but device
//! initialization fails.

pub mod cli;
pub mod core;
pub mod device;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
