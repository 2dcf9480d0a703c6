//! Device filters used to pick which attached device an import drains
//!
//! A filter sees the device index, the opened handle and the composed label
//! (`MTP#<index> - '<name> (<description>)'`). Filters compose with
//! [`Not`], [`AllOf`] and [`AnyOf`]; the presets below describe the device
//! classes the CLI knows about.

use crate::device::traits::{normalize_device_path, DeviceHandle};
use std::fmt;

/// GoPro media folder
pub const GOPRO_DIR: &str = "DCIM/100GOPRO";

/// Panasonic camcorder AVCHD stream folder
pub const CAM_FILES_DIR: &str = "PRIVATE/AVCHD/BDMV/STREAM";

/// Generic camera folder
pub const DCIM_DIR: &str = "DCIM";

/// Decides whether an opened device should be drained
pub trait DeviceFilter: fmt::Debug {
    fn accept(&self, index: usize, handle: &dyn DeviceHandle, label: &str) -> bool;
}

/// Label contains a substring (case-sensitive)
#[derive(Debug, Clone)]
pub struct LabelContains(pub String);

impl DeviceFilter for LabelContains {
    fn accept(&self, _index: usize, _handle: &dyn DeviceHandle, label: &str) -> bool {
        label.contains(&self.0)
    }
}

/// A file or folder exists at a device path
#[derive(Debug, Clone)]
pub struct HasPath(pub String);

impl DeviceFilter for HasPath {
    fn accept(&self, _index: usize, handle: &dyn DeviceHandle, _label: &str) -> bool {
        handle.find_object(&normalize_device_path(&self.0)).is_some()
    }
}

/// Inverts another filter
#[derive(Debug)]
pub struct Not(pub Box<dyn DeviceFilter>);

impl DeviceFilter for Not {
    fn accept(&self, index: usize, handle: &dyn DeviceHandle, label: &str) -> bool {
        !self.0.accept(index, handle, label)
    }
}

/// Every inner filter accepts (true when empty)
#[derive(Debug)]
pub struct AllOf(pub Vec<Box<dyn DeviceFilter>>);

impl DeviceFilter for AllOf {
    fn accept(&self, index: usize, handle: &dyn DeviceHandle, label: &str) -> bool {
        self.0.iter().all(|f| f.accept(index, handle, label))
    }
}

/// At least one inner filter accepts (false when empty)
#[derive(Debug)]
pub struct AnyOf(pub Vec<Box<dyn DeviceFilter>>);

impl DeviceFilter for AnyOf {
    fn accept(&self, index: usize, handle: &dyn DeviceHandle, label: &str) -> bool {
        self.0.iter().any(|f| f.accept(index, handle, label))
    }
}

/// GoPro cameras: "HERO" or "GoPro" in the label, or a `DCIM/100GOPRO` folder
pub fn gopro() -> Box<dyn DeviceFilter> {
    Box::new(AnyOf(vec![
        Box::new(LabelContains("HERO".to_string())),
        Box::new(LabelContains("GoPro".to_string())),
        Box::new(HasPath(GOPRO_DIR.to_string())),
    ]))
}

/// Camcorders: "CAM" in the label and an AVCHD stream folder
pub fn camcorder() -> Box<dyn DeviceFilter> {
    Box::new(AllOf(vec![
        Box::new(LabelContains("CAM".to_string())),
        Box::new(HasPath(CAM_FILES_DIR.to_string())),
    ]))
}

/// Plain SD cards: a `DCIM` folder on something that is neither a GoPro nor a camcorder
pub fn sd_card() -> Box<dyn DeviceFilter> {
    Box::new(AllOf(vec![
        Box::new(HasPath(DCIM_DIR.to_string())),
        Box::new(Not(gopro())),
        Box::new(Not(camcorder())),
    ]))
}
