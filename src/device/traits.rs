//! Device abstraction traits for testability
//!
//! This module defines the narrow surface the transfer engine needs from a
//! device-access library, so that the Windows Portable Devices backend and the
//! in-memory mock used by tests can be swapped freely.
//!
//! # Architecture
//!
//! - `DeviceLibrary` - process-wide library: init/teardown, enumeration, selection
//! - `DeviceHandle` - one selected device: lookup by path, listing, reading, deletion
//! - `DeviceObject` - one file or directory entry reported by a device
//!
//! Device paths are `/`-separated and absolute, e.g. `/DCIM/100GOPRO/GOPR0001.JPG`.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use media_tool::device::traits::{DeviceHandle, DeviceLibrary};
//!
//! fn count_root_entries<L: DeviceLibrary>(library: &mut L) -> media_tool::core::error::Result<usize> {
//!     library.init()?;
//!     let handle = library.select_device(0)?;
//!     let root = handle.find_object("/DCIM");
//!     let count = match root {
//!         Some(obj) => handle.list_children(&obj.id)?.len(),
//!         None => 0,
//!     };
//!     library.teardown();
//!     Ok(count)
//! }
//! ```

use crate::core::error::Result;
use chrono::{DateTime, Utc};
use std::io::Read;

/// Separator used in device-side paths
pub const PATH_SEPARATOR: char = '/';

/// Represents a file or folder on a device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceObject {
    /// Opaque object identifier on the device
    pub id: String,
    /// Name of the object (file or folder name)
    pub name: String,
    /// Size in bytes (0 for folders)
    pub size: u64,
    /// Whether this is a folder
    pub is_dir: bool,
    /// Last modification time, if the device reports one
    pub modified: Option<DateTime<Utc>>,
}

impl DeviceObject {
    /// Create a new folder object
    pub fn folder(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            size: 0,
            is_dir: true,
            modified: None,
        }
    }

    /// Create a new file object
    pub fn file(id: &str, name: &str, size: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            size,
            is_dir: false,
            modified: None,
        }
    }

    /// Set the modification time
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// One selected device
///
/// All calls are made from a single thread; implementations are not required
/// to be reentrant.
pub trait DeviceHandle {
    /// Resolve an absolute device path to an object, `None` when nothing is there
    fn find_object(&self, path: &str) -> Option<DeviceObject>;

    /// List the direct children of a folder in device order
    fn list_children(&self, object_id: &str) -> Result<Vec<DeviceObject>>;

    /// Open a byte stream over a file's content
    fn open_reader(&self, object_id: &str) -> Result<Box<dyn Read + '_>>;

    /// Delete a single object
    fn delete(&self, object_id: &str) -> Result<()>;
}

/// A device-access library (WPD on Windows, mock in tests)
pub trait DeviceLibrary {
    /// The handle type returned when a device is selected
    type Handle: DeviceHandle;

    /// Initialize the library; must succeed before any other call
    fn init(&mut self) -> Result<()>;

    /// Release every library resource
    fn teardown(&mut self);

    /// Number of attached devices
    fn device_count(&self) -> usize;

    /// Friendly name of the device at `index`
    fn device_name(&self, index: usize) -> String;

    /// Description of the device at `index`
    fn device_description(&self, index: usize) -> String;

    /// Open the device at `index`
    fn select_device(&mut self, index: usize) -> Result<Self::Handle>;
}

/// Join a device directory path and an entry name
pub fn join_device_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches(PATH_SEPARATOR);
    format!("{}{}{}", parent, PATH_SEPARATOR, name)
}

/// Normalize a user supplied device directory (`DCIM\100GOPRO`, `DCIM/100GOPRO/`)
/// into an absolute device path (`/DCIM/100GOPRO`)
pub fn normalize_device_path(dir: &str) -> String {
    let parts: Vec<&str> = device_path_components(dir).collect();
    format!("{}{}", PATH_SEPARATOR, parts.join(&PATH_SEPARATOR.to_string()))
}

/// Split a device path into its non-empty components, accepting both separators
pub fn device_path_components(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|part| !part.is_empty())
}
