//! Device interaction module
//!
//! Access to MTP devices through a narrow trait surface so the import engine
//! runs unchanged against Windows Portable Devices or the in-memory mocks.
//!
//! # Submodules
//!
//! - `traits` - `DeviceLibrary` / `DeviceHandle` abstraction and device path helpers
//! - `filters` - Device acceptance predicates and the GoPro/camcorder/SD presets
//! - `timestamps` - OLE date conversion for WPD modification times
//! - `wpd` - Windows Portable Devices backend (Windows only)
//! - `unsupported` - Library that refuses to initialize on other platforms

pub mod filters;
pub mod timestamps;
pub mod traits;

#[cfg(windows)]
pub mod wpd;

#[cfg(not(windows))]
pub mod unsupported;

pub use filters::DeviceFilter;
pub use traits::{DeviceHandle, DeviceLibrary, DeviceObject};

/// Device library for the current platform
#[cfg(windows)]
pub type PlatformLibrary = wpd::WpdLibrary;

/// Device library for the current platform
#[cfg(not(windows))]
pub type PlatformLibrary = unsupported::UnsupportedLibrary;
