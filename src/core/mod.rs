//! Core functionality module
//!
//! Device-independent import engine: the tree walker, the execution plan,
//! the copy and cleanup passes and the session that drives them per device.
//!
//! # Submodules
//!
//! - `config` - Configuration loading and generation
//! - `error` - Error types and result aliases
//! - `tree` - Device tree arena and the walker that fills it
//! - `plan` - Ordered list of files to copy
//! - `transfer` - Copying planned files into the staging directory
//! - `cleanup` - Removing copied files from the device
//! - `session` - Library lifecycle and device iteration
//! - `presets` - Named import sources and their rename passes
//! - `exiftool` - ExifTool command builder
//! - `staging` - Staging directory removal
//! - `local` - ExifTool passes over local folders

pub mod cleanup;
pub mod config;
pub mod error;
pub mod exiftool;
pub mod local;
pub mod plan;
pub mod presets;
pub mod progress;
pub mod session;
pub mod staging;
pub mod transfer;
pub mod tree;
