//! Stand-in library for platforms without WPD

use crate::core::error::{MediaToolError, Result};
use crate::device::traits::{DeviceHandle, DeviceLibrary, DeviceObject};
use std::io::Read;

/// Library that never initializes
#[derive(Debug, Default)]
pub struct UnsupportedLibrary;

/// Never constructed
#[derive(Debug)]
pub enum NoDevice {}

impl DeviceHandle for NoDevice {
    fn find_object(&self, _path: &str) -> Option<DeviceObject> {
        match *self {}
    }

    fn list_children(&self, _object_id: &str) -> Result<Vec<DeviceObject>> {
        match *self {}
    }

    fn open_reader(&self, _object_id: &str) -> Result<Box<dyn Read + '_>> {
        match *self {}
    }

    fn delete(&self, _object_id: &str) -> Result<()> {
        match *self {}
    }
}

impl UnsupportedLibrary {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceLibrary for UnsupportedLibrary {
    type Handle = NoDevice;

    fn init(&mut self) -> Result<()> {
        Err(MediaToolError::LibraryInit(
            "MTP devices are only supported on Windows (WPD)".to_string(),
        ))
    }

    fn teardown(&mut self) {}

    fn device_count(&self) -> usize {
        0
    }

    fn device_name(&self, _index: usize) -> String {
        String::new()
    }

    fn device_description(&self, _index: usize) -> String {
        String::new()
    }

    fn select_device(&mut self, index: usize) -> Result<NoDevice> {
        Err(MediaToolError::DeviceSelect {
            index,
            message: "no device library on this platform".to_string(),
        })
    }
}
