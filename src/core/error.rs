//! Error types for the media tool
//!
//! Only session-level failures are returned to callers. Per-device and per-file
//! errors are produced with these same variants but are logged and absorbed by
//! the transfer and cleanup passes.

use thiserror::Error;

/// Main error type for the media tool
#[derive(Error, Debug)]
pub enum MediaToolError {
    /// The device-access library could not be initialized
    #[error("Device library initialization failed: {0}")]
    LibraryInit(String),

    /// A device could not be selected/opened
    #[error("Unable to open device #{index}: {message}")]
    DeviceSelect { index: usize, message: String },

    /// General device communication error
    #[error("Device error: {0}")]
    Device(String),

    /// An object id or device path does not resolve to anything
    #[error("Object not found on device: {0}")]
    ObjectNotFound(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(String),

    /// Copying a single file failed
    #[error("Transfer failed for '{path}': {message}")]
    Transfer { path: String, message: String },

    /// The number of bytes written does not match the size reported by the device
    #[error("Incomplete copy of '{path}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    /// Removing a file from the device failed
    #[error("Failed to delete '{path}': {message}")]
    Delete { path: String, message: String },

    /// Filtered enumeration finished without a matching device
    #[error("No matching device found ({0})")]
    NoMatchingDevice(String),

    /// The external metadata tool could not be run or reported failure
    #[error("ExifTool error: {0}")]
    ExifTool(String),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] windows::core::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MediaToolError>;

impl From<std::io::Error> for MediaToolError {
    fn from(err: std::io::Error) -> Self {
        MediaToolError::Io(err.to_string())
    }
}
