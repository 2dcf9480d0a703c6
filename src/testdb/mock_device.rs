//! Mock device implementation for testing without a real device
//!
//! This module provides in-memory implementations of [`DeviceLibrary`] and
//! [`DeviceHandle`] that simulate attached cameras and card readers with a
//! configurable file structure and injectable failures.

use crate::core::error::{MediaToolError, Result};
use crate::device::traits::{
    device_path_components, join_device_path, DeviceHandle, DeviceLibrary, DeviceObject,
};
use chrono::{DateTime, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::rc::Rc;

/// Object id of the device root folder
pub const ROOT_OBJECT_ID: &str = "DEVICE";

/// Default modification time given to mock files
pub fn default_modified() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Entry used to populate a [`MockDevice`]
#[derive(Debug, Clone)]
pub struct MockEntry {
    /// Absolute device path
    pub path: String,
    /// File content, `None` for folders
    pub content: Option<Vec<u8>>,
    /// Size reported by the device (defaults to the content length)
    pub reported_size: Option<u64>,
    /// Modification time reported by the device
    pub modified: Option<DateTime<Utc>>,
}

impl MockEntry {
    /// A folder at `path`
    pub fn folder(path: &str) -> Self {
        Self {
            path: path.to_string(),
            content: None,
            reported_size: None,
            modified: None,
        }
    }

    /// A file at `path` holding `content`
    pub fn file(path: &str, content: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            content: Some(content.to_vec()),
            reported_size: None,
            modified: Some(default_modified()),
        }
    }

    /// A file filled with `size` bytes of generated content
    pub fn sized_file(path: &str, size: usize) -> Self {
        let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        Self::file(path, &content)
    }

    /// Report a size that differs from the real content length
    pub fn with_reported_size(mut self, size: u64) -> Self {
        self.reported_size = Some(size);
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

#[derive(Debug, Clone)]
struct MockObject {
    object: DeviceObject,
    path: String,
    parent_id: String,
    content: Vec<u8>,
}

/// One simulated device with an in-memory file system
#[derive(Debug)]
pub struct MockDevice {
    name: String,
    description: String,
    objects: RefCell<HashMap<String, MockObject>>,
    children_index: RefCell<HashMap<String, Vec<String>>>,
    next_id: Cell<usize>,
    list_errors: HashSet<String>,
    read_errors: HashSet<String>,
    delete_errors: HashSet<String>,
    reads: RefCell<Vec<String>>,
    deleted: RefCell<Vec<String>>,
}

impl MockDevice {
    /// Create an empty device
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            objects: RefCell::new(HashMap::new()),
            children_index: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            list_errors: HashSet::new(),
            read_errors: HashSet::new(),
            delete_errors: HashSet::new(),
            reads: RefCell::new(Vec::new()),
            deleted: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Add an entry, creating missing parent folders
    pub fn add(&mut self, entry: MockEntry) -> &mut Self {
        let components: Vec<&str> = device_path_components(&entry.path).collect();
        let Some((leaf, parents)) = components.split_last() else {
            return self;
        };

        let mut parent_id = ROOT_OBJECT_ID.to_string();
        let mut parent_path = "/".to_string();
        for part in parents {
            parent_path = join_device_path(&parent_path, part);
            parent_id = match self.id_of(&parent_path) {
                Some(id) => id,
                None => self.insert_object(&parent_id, &parent_path, DeviceObject::folder("", part), Vec::new()),
            };
        }

        let path = join_device_path(&parent_path, leaf);
        if self.id_of(&path).is_some() {
            return self;
        }

        match entry.content {
            Some(content) => {
                let size = entry.reported_size.unwrap_or(content.len() as u64);
                let mut object = DeviceObject::file("", leaf, size);
                object.modified = entry.modified;
                self.insert_object(&parent_id, &path, object, content);
            }
            None => {
                self.insert_object(&parent_id, &path, DeviceObject::folder("", leaf), Vec::new());
            }
        }
        self
    }

    fn insert_object(
        &mut self,
        parent_id: &str,
        path: &str,
        mut object: DeviceObject,
        content: Vec<u8>,
    ) -> String {
        let id = format!("o{}", self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        object.id = id.clone();

        self.objects.get_mut().insert(
            id.clone(),
            MockObject {
                object,
                path: path.to_string(),
                parent_id: parent_id.to_string(),
                content,
            },
        );
        self.children_index
            .get_mut()
            .entry(parent_id.to_string())
            .or_default()
            .push(id.clone());
        id
    }

    fn id_of(&self, path: &str) -> Option<String> {
        self.objects
            .borrow()
            .values()
            .find(|o| o.path == path)
            .map(|o| o.object.id.clone())
    }

    /// Make listing the folder at `path` fail
    pub fn fail_listing(&mut self, path: &str) -> &mut Self {
        self.list_errors.insert(path.to_string());
        self
    }

    /// Make reading the file at `path` fail
    pub fn fail_reading(&mut self, path: &str) -> &mut Self {
        self.read_errors.insert(path.to_string());
        self
    }

    /// Make deleting the object at `path` fail
    pub fn fail_deleting(&mut self, path: &str) -> &mut Self {
        self.delete_errors.insert(path.to_string());
        self
    }

    /// Whether an object currently exists at `path`
    pub fn exists(&self, path: &str) -> bool {
        self.id_of(path).is_some()
    }

    /// Paths of files opened for reading, in order
    pub fn reads(&self) -> Vec<String> {
        self.reads.borrow().clone()
    }

    /// Paths of objects deleted, in order
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.borrow().clone()
    }

    fn path_of(&self, object_id: &str) -> Result<String> {
        self.objects
            .borrow()
            .get(object_id)
            .map(|o| o.path.clone())
            .ok_or_else(|| MediaToolError::ObjectNotFound(object_id.to_string()))
    }
}

impl DeviceHandle for MockDevice {
    fn find_object(&self, path: &str) -> Option<DeviceObject> {
        let components: Vec<&str> = device_path_components(path).collect();
        if components.is_empty() {
            return Some(DeviceObject::folder(ROOT_OBJECT_ID, ""));
        }
        let normalized = format!("/{}", components.join("/"));
        self.objects
            .borrow()
            .values()
            .find(|o| o.path == normalized)
            .map(|o| o.object.clone())
    }

    fn list_children(&self, object_id: &str) -> Result<Vec<DeviceObject>> {
        let path = if object_id == ROOT_OBJECT_ID {
            "/".to_string()
        } else {
            self.path_of(object_id)?
        };
        if self.list_errors.contains(&path) {
            return Err(MediaToolError::Device(format!("listing {} failed", path)));
        }

        let objects = self.objects.borrow();
        let children = self.children_index.borrow();
        Ok(children
            .get(object_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| objects.get(id))
                    .map(|o| o.object.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn open_reader(&self, object_id: &str) -> Result<Box<dyn Read + '_>> {
        let path = self.path_of(object_id)?;
        self.reads.borrow_mut().push(path.clone());
        if self.read_errors.contains(&path) {
            return Err(MediaToolError::Device(format!("read of {} failed", path)));
        }

        let objects = self.objects.borrow();
        let object = objects
            .get(object_id)
            .ok_or_else(|| MediaToolError::ObjectNotFound(object_id.to_string()))?;
        if object.object.is_dir {
            return Err(MediaToolError::Device(format!("{} is a folder", path)));
        }
        Ok(Box::new(Cursor::new(object.content.clone())))
    }

    fn delete(&self, object_id: &str) -> Result<()> {
        let path = self.path_of(object_id)?;
        if self.delete_errors.contains(&path) {
            return Err(MediaToolError::Device(format!("delete of {} refused", path)));
        }

        let removed = self.objects.borrow_mut().remove(object_id);
        if let Some(object) = removed {
            if let Some(siblings) = self.children_index.borrow_mut().get_mut(&object.parent_id) {
                siblings.retain(|id| id != object_id);
            }
        }
        self.deleted.borrow_mut().push(path);
        Ok(())
    }
}

/// Handle returned by [`MockDeviceLibrary::select_device`]
#[derive(Debug, Clone)]
pub struct MockHandle(pub Rc<MockDevice>);

impl DeviceHandle for MockHandle {
    fn find_object(&self, path: &str) -> Option<DeviceObject> {
        self.0.find_object(path)
    }

    fn list_children(&self, object_id: &str) -> Result<Vec<DeviceObject>> {
        self.0.list_children(object_id)
    }

    fn open_reader(&self, object_id: &str) -> Result<Box<dyn Read + '_>> {
        self.0.open_reader(object_id)
    }

    fn delete(&self, object_id: &str) -> Result<()> {
        self.0.delete(object_id)
    }
}

/// Calls made against a [`MockDeviceLibrary`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryCall {
    Init,
    Select(usize),
    Teardown,
}

/// Simulated device-access library holding several devices
#[derive(Debug, Default)]
pub struct MockDeviceLibrary {
    devices: Vec<Rc<MockDevice>>,
    select_errors: HashSet<usize>,
    init_error: Option<String>,
    initialized: bool,
    calls: Vec<LibraryCall>,
}

impl MockDeviceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device; its index is the number of devices attached before it
    pub fn attach(&mut self, device: MockDevice) -> Rc<MockDevice> {
        let device = Rc::new(device);
        self.devices.push(Rc::clone(&device));
        device
    }

    /// Make selecting the device at `index` fail
    pub fn fail_select(&mut self, index: usize) -> &mut Self {
        self.select_errors.insert(index);
        self
    }

    /// Make `init` fail with `message`
    pub fn fail_init(&mut self, message: &str) -> &mut Self {
        self.init_error = Some(message.to_string());
        self
    }

    pub fn device(&self, index: usize) -> Rc<MockDevice> {
        Rc::clone(&self.devices[index])
    }

    pub fn calls(&self) -> &[LibraryCall] {
        &self.calls
    }

    /// Indices passed to `select_device`, in order
    pub fn selected(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                LibraryCall::Select(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn teardown_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == LibraryCall::Teardown)
            .count()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl DeviceLibrary for MockDeviceLibrary {
    type Handle = MockHandle;

    fn init(&mut self) -> Result<()> {
        self.calls.push(LibraryCall::Init);
        if let Some(message) = &self.init_error {
            return Err(MediaToolError::LibraryInit(message.clone()));
        }
        self.initialized = true;
        Ok(())
    }

    fn teardown(&mut self) {
        self.calls.push(LibraryCall::Teardown);
        self.initialized = false;
    }

    fn device_count(&self) -> usize {
        if self.initialized {
            self.devices.len()
        } else {
            0
        }
    }

    fn device_name(&self, index: usize) -> String {
        self.devices
            .get(index)
            .map(|d| d.name().to_string())
            .unwrap_or_default()
    }

    fn device_description(&self, index: usize) -> String {
        self.devices
            .get(index)
            .map(|d| d.description().to_string())
            .unwrap_or_default()
    }

    fn select_device(&mut self, index: usize) -> Result<MockHandle> {
        self.calls.push(LibraryCall::Select(index));
        if !self.initialized {
            return Err(MediaToolError::LibraryInit("library not initialized".to_string()));
        }
        if self.select_errors.contains(&index) {
            return Err(MediaToolError::DeviceSelect {
                index,
                message: "device busy".to_string(),
            });
        }
        self.devices
            .get(index)
            .map(|d| MockHandle(Rc::clone(d)))
            .ok_or_else(|| MediaToolError::DeviceSelect {
                index,
                message: "no such device".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_creates_parents() {
        let mut device = MockDevice::new("Card", "SD");
        device.add(MockEntry::file("/DCIM/100CANON/IMG_0001.JPG", b"abc"));

        assert!(device.exists("/DCIM"));
        assert!(device.exists("/DCIM/100CANON"));

        let dcim = device.find_object("DCIM").unwrap();
        assert!(dcim.is_dir);
        let file = device.find_object("/DCIM/100CANON/IMG_0001.JPG").unwrap();
        assert_eq!(file.size, 3);
        assert_eq!(file.modified, Some(default_modified()));
    }

    #[test]
    fn test_root_lookup_and_listing() {
        let mut device = MockDevice::new("Card", "SD");
        device.add(MockEntry::folder("/DCIM"));
        device.add(MockEntry::folder("/MISC"));

        let root = device.find_object("/").unwrap();
        assert_eq!(root.id, ROOT_OBJECT_ID);
        let names: Vec<String> = device
            .list_children(&root.id)
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["DCIM", "MISC"]);
    }

    #[test]
    fn test_read_and_delete() {
        let mut device = MockDevice::new("Card", "SD");
        device.add(MockEntry::file("/a.jpg", b"hello"));
        let file = device.find_object("/a.jpg").unwrap();

        let mut content = Vec::new();
        device
            .open_reader(&file.id)
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"hello");

        device.delete(&file.id).unwrap();
        assert!(!device.exists("/a.jpg"));
        assert_eq!(device.deleted(), vec!["/a.jpg"]);
        assert!(device.list_children(ROOT_OBJECT_ID).unwrap().is_empty());
    }

    #[test]
    fn test_injected_failures() {
        let mut device = MockDevice::new("Card", "SD");
        device.add(MockEntry::file("/a.jpg", b"hello"));
        device.fail_reading("/a.jpg").fail_deleting("/a.jpg");
        let file = device.find_object("/a.jpg").unwrap();

        assert!(device.open_reader(&file.id).is_err());
        assert!(device.delete(&file.id).is_err());
        assert!(device.exists("/a.jpg"));
    }

    #[test]
    fn test_library_records_calls() {
        let mut library = MockDeviceLibrary::new();
        library.attach(MockDevice::new("HERO9", "GoPro"));
        library.fail_select(1);

        assert_eq!(library.device_count(), 0);
        library.init().unwrap();
        assert_eq!(library.device_count(), 1);
        assert_eq!(library.device_name(0), "HERO9");
        assert!(library.select_device(0).is_ok());
        assert!(library.select_device(1).is_err());
        library.teardown();

        assert_eq!(
            library.calls(),
            &[
                LibraryCall::Init,
                LibraryCall::Select(0),
                LibraryCall::Select(1),
                LibraryCall::Teardown
            ]
        );
    }
}
