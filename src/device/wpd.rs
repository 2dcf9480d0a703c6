//! Windows Portable Devices backend
//!
//! Implements [`DeviceLibrary`] and [`DeviceHandle`] on top of the WPD COM
//! API. COM is initialized by [`WpdLibrary::init`] and released again by
//! [`WpdLibrary::teardown`].

use crate::core::error::{MediaToolError, Result};
use crate::device::timestamps::ole_date_to_utc;
use crate::device::traits::{device_path_components, DeviceHandle, DeviceLibrary, DeviceObject};
use log::{debug, info, trace, warn};
use std::io::{self, Read};
use std::ptr::null_mut;
use windows::{
    core::{GUID, PCWSTR, PROPVARIANT, PWSTR},
    Win32::{
        Devices::PortableDevices::{
            IEnumPortableDeviceObjectIDs, IPortableDevice, IPortableDeviceContent,
            IPortableDeviceKeyCollection, IPortableDeviceManager, IPortableDevicePropVariantCollection,
            IPortableDeviceProperties, IPortableDeviceResources, IPortableDeviceValues,
            PortableDeviceFTM, PortableDeviceKeyCollection, PortableDeviceManager,
            PortableDevicePropVariantCollection, PortableDeviceValues, WPD_CLIENT_MAJOR_VERSION,
            WPD_CLIENT_MINOR_VERSION, WPD_CLIENT_NAME, WPD_CLIENT_REVISION,
            WPD_CLIENT_SECURITY_QUALITY_OF_SERVICE, WPD_OBJECT_CONTENT_TYPE,
            WPD_OBJECT_DATE_MODIFIED, WPD_OBJECT_NAME, WPD_OBJECT_ORIGINAL_FILE_NAME,
            WPD_OBJECT_SIZE, WPD_RESOURCE_DEFAULT,
        },
        System::{
            Com::{
                CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, IStream,
                CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED,
            },
            Variant::VT_LPWSTR,
        },
        UI::Shell::PropertiesSystem::PROPERTYKEY,
    },
};

/// Object id of the device root
const ROOT_OBJECT_ID: &str = "DEVICE";

/// GUID for folder content type
const WPD_CONTENT_TYPE_FOLDER: GUID = GUID::from_u128(0x27e2e392_a111_48e0_ab0c_e17705a05f85);

/// GUID for functional object content type (storage objects like "SD Card")
const WPD_CONTENT_TYPE_FUNCTIONAL_OBJECT: GUID =
    GUID::from_u128(0x99ed0160_17ff_4c44_9d98_1d7a6f941921);

/// Client name reported to the device driver
const CLIENT_NAME: &str = "media-tool";

/// Default stream buffer when the driver has no preference
const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// RAII guard for COM initialization
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    /// Initialize COM library
    pub fn new() -> Result<Self> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(|e| {
                    MediaToolError::LibraryInit(format!("Failed to initialize COM: {}", e))
                })?;

            Ok(Self { initialized: true })
        }
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

#[derive(Debug, Clone)]
struct DeviceEntry {
    id: String,
    name: String,
    description: String,
}

/// WPD device library
///
/// Device names and descriptions are read once during [`init`](DeviceLibrary::init).
#[derive(Default)]
pub struct WpdLibrary {
    manager: Option<IPortableDeviceManager>,
    devices: Vec<DeviceEntry>,
    // Dropped last so COM outlives every interface above
    com: Option<ComGuard>,
}

impl WpdLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    fn manager(&self) -> Result<&IPortableDeviceManager> {
        self.manager
            .as_ref()
            .ok_or_else(|| MediaToolError::LibraryInit("library is not initialized".to_string()))
    }

    fn enumerate(manager: &IPortableDeviceManager) -> Result<Vec<DeviceEntry>> {
        unsafe {
            if let Err(e) = manager.RefreshDeviceList() {
                debug!("Device list refresh failed, using the cached list: {}", e);
            }

            let mut device_count: u32 = 0;
            manager
                .GetDevices(null_mut(), &mut device_count)
                .map_err(|e| MediaToolError::Device(format!("Failed to get device count: {}", e)))?;

            if device_count == 0 {
                return Ok(Vec::new());
            }

            let mut device_ids: Vec<PWSTR> = vec![PWSTR::null(); device_count as usize];
            manager
                .GetDevices(device_ids.as_mut_ptr(), &mut device_count)
                .map_err(|e| {
                    MediaToolError::Device(format!("Failed to enumerate devices: {}", e))
                })?;

            let mut devices = Vec::new();
            for device_id_ptr in device_ids.iter().take(device_count as usize) {
                if device_id_ptr.is_null() {
                    continue;
                }

                let id = device_id_ptr.to_string().unwrap_or_default();
                let id_wide = wide(&id);
                let id_pcwstr = PCWSTR(id_wide.as_ptr());

                let name = read_manager_string(|buf, len| {
                    manager.GetDeviceFriendlyName(id_pcwstr, buf, len)
                })
                .unwrap_or_else(|| "Unknown Device".to_string());
                let description = read_manager_string(|buf, len| {
                    manager.GetDeviceDescription(id_pcwstr, buf, len)
                })
                .unwrap_or_else(|| "Unknown".to_string());

                debug!("Found device '{}' ({}) id: {}", name, description, id);
                devices.push(DeviceEntry {
                    id,
                    name,
                    description,
                });

                CoTaskMemFree(Some(device_id_ptr.0 as *const _));
            }

            Ok(devices)
        }
    }

    fn open(&self, entry: &DeviceEntry) -> Result<IPortableDevice> {
        unsafe {
            let device: IPortableDevice =
                CoCreateInstance(&PortableDeviceFTM, None, CLSCTX_INPROC_SERVER).map_err(|e| {
                    MediaToolError::Device(format!("Failed to create device object: {}", e))
                })?;

            let client_info: IPortableDeviceValues =
                CoCreateInstance(&PortableDeviceValues, None, CLSCTX_INPROC_SERVER).map_err(
                    |e| MediaToolError::Device(format!("Failed to create client info: {}", e)),
                )?;

            let client_name = wide(CLIENT_NAME);
            client_info.SetStringValue(&WPD_CLIENT_NAME, PCWSTR(client_name.as_ptr()))?;
            client_info.SetUnsignedIntegerValue(&WPD_CLIENT_MAJOR_VERSION, 1)?;
            client_info.SetUnsignedIntegerValue(&WPD_CLIENT_MINOR_VERSION, 0)?;
            client_info.SetUnsignedIntegerValue(&WPD_CLIENT_REVISION, 0)?;
            client_info
                .SetUnsignedIntegerValue(&WPD_CLIENT_SECURITY_QUALITY_OF_SERVICE, 0x00020000)?;

            let id_wide = wide(&entry.id);
            device
                .Open(PCWSTR(id_wide.as_ptr()), &client_info)
                .map_err(|e| MediaToolError::Device(format!("Failed to open device: {}", e)))?;

            info!("Opened device '{}'", entry.name);
            Ok(device)
        }
    }
}

/// Two-call WPD string getter: query the length, then fill a buffer
fn read_manager_string<F>(mut get: F) -> Option<String>
where
    F: FnMut(PWSTR, *mut u32) -> windows::core::Result<()>,
{
    let mut length: u32 = 0;
    let _ = get(PWSTR::null(), &mut length);
    if length == 0 {
        return None;
    }

    let mut buffer: Vec<u16> = vec![0; length as usize];
    get(PWSTR(buffer.as_mut_ptr()), &mut length).ok()?;
    let end = (length as usize).saturating_sub(1).min(buffer.len());
    Some(String::from_utf16_lossy(&buffer[..end]))
}

impl DeviceLibrary for WpdLibrary {
    type Handle = WpdDevice;

    fn init(&mut self) -> Result<()> {
        self.com = Some(ComGuard::new()?);

        let manager: IPortableDeviceManager = unsafe {
            CoCreateInstance(&PortableDeviceManager, None, CLSCTX_INPROC_SERVER).map_err(|e| {
                MediaToolError::LibraryInit(format!("Failed to create device manager: {}", e))
            })?
        };

        self.devices = Self::enumerate(&manager)?;
        self.manager = Some(manager);
        info!("WPD initialized, {} device(s) attached", self.devices.len());
        Ok(())
    }

    fn teardown(&mut self) {
        self.devices.clear();
        self.manager = None;
        if self.com.take().is_some() {
            debug!("WPD released");
        }
    }

    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn device_name(&self, index: usize) -> String {
        self.devices
            .get(index)
            .map(|d| d.name.clone())
            .unwrap_or_default()
    }

    fn device_description(&self, index: usize) -> String {
        self.devices
            .get(index)
            .map(|d| d.description.clone())
            .unwrap_or_default()
    }

    fn select_device(&mut self, index: usize) -> Result<WpdDevice> {
        self.manager()?;
        let entry = self
            .devices
            .get(index)
            .ok_or_else(|| MediaToolError::DeviceSelect {
                index,
                message: "no such device".to_string(),
            })?
            .clone();

        let select_err = |e: MediaToolError| MediaToolError::DeviceSelect {
            index,
            message: e.to_string(),
        };

        let device = self.open(&entry).map_err(select_err)?;
        WpdDevice::new(device).map_err(select_err)
    }
}

/// One opened WPD device
pub struct WpdDevice {
    device: IPortableDevice,
    content: IPortableDeviceContent,
    properties: IPortableDeviceProperties,
    resources: IPortableDeviceResources,
    keys: IPortableDeviceKeyCollection,
}

impl WpdDevice {
    fn new(device: IPortableDevice) -> Result<Self> {
        unsafe {
            let content = device.Content()?;
            let properties = content.Properties()?;
            let resources = content.Transfer()?;

            let keys: IPortableDeviceKeyCollection =
                CoCreateInstance(&PortableDeviceKeyCollection, None, CLSCTX_INPROC_SERVER)?;
            keys.Add(&WPD_OBJECT_NAME)?;
            keys.Add(&WPD_OBJECT_ORIGINAL_FILE_NAME)?;
            keys.Add(&WPD_OBJECT_CONTENT_TYPE)?;
            keys.Add(&WPD_OBJECT_SIZE)?;
            keys.Add(&WPD_OBJECT_DATE_MODIFIED)?;

            Ok(Self {
                device,
                content,
                properties,
                resources,
                keys,
            })
        }
    }

    fn root_object() -> DeviceObject {
        DeviceObject::folder(ROOT_OBJECT_ID, "")
    }

    /// Child of `parent_id` named `name` (case-insensitive)
    fn child_named(&self, parent_id: &str, name: &str) -> Option<DeviceObject> {
        match self.list_children(parent_id) {
            Ok(children) => children
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(name)),
            Err(e) => {
                debug!("Lookup of '{}' in '{}' failed: {}", name, parent_id, e);
                None
            }
        }
    }

    fn read_object(&self, object_id: &str) -> Result<DeviceObject> {
        unsafe {
            let id_wide = wide(object_id);
            let values = self
                .properties
                .GetValues(PCWSTR(id_wide.as_ptr()), &self.keys)?;
            Ok(parse_object_properties(object_id, &values))
        }
    }
}

fn parse_object_properties(object_id: &str, values: &IPortableDeviceValues) -> DeviceObject {
    unsafe {
        let name = get_string_value(values, &WPD_OBJECT_ORIGINAL_FILE_NAME)
            .or_else(|| get_string_value(values, &WPD_OBJECT_NAME))
            .unwrap_or_else(|| object_id.to_string());

        let is_dir = match values.GetGuidValue(&WPD_OBJECT_CONTENT_TYPE) {
            Ok(content_type) => {
                content_type == WPD_CONTENT_TYPE_FOLDER
                    || content_type == WPD_CONTENT_TYPE_FUNCTIONAL_OBJECT
            }
            Err(_) => false,
        };

        let size = if is_dir {
            0
        } else {
            values
                .GetUnsignedLargeIntegerValue(&WPD_OBJECT_SIZE)
                .unwrap_or(0)
        };

        let mut object = if is_dir {
            DeviceObject::folder(object_id, &name)
        } else {
            DeviceObject::file(object_id, &name, size)
        };

        if let Ok(value) = values.GetValue(&WPD_OBJECT_DATE_MODIFIED) {
            if let Some(modified) = f64::try_from(&value).ok().and_then(ole_date_to_utc) {
                object = object.with_modified(modified);
            }
        }

        object
    }
}

fn get_string_value(values: &IPortableDeviceValues, key: &PROPERTYKEY) -> Option<String> {
    unsafe {
        let pwstr = values.GetStringValue(key).ok()?;
        let result = pwstr.to_string().ok();
        CoTaskMemFree(Some(pwstr.0 as *const _));
        result
    }
}

impl DeviceHandle for WpdDevice {
    fn find_object(&self, path: &str) -> Option<DeviceObject> {
        let mut components = device_path_components(path).peekable();
        let Some(first) = components.next() else {
            return Some(Self::root_object());
        };

        // The first component is either directly under DEVICE or inside a storage object
        let mut current = match self.child_named(ROOT_OBJECT_ID, first) {
            Some(obj) => obj,
            None => {
                let storages = self.list_children(ROOT_OBJECT_ID).ok()?;
                storages
                    .iter()
                    .filter(|s| s.is_dir)
                    .find_map(|s| self.child_named(&s.id, first))?
            }
        };

        for name in components {
            if !current.is_dir {
                return None;
            }
            current = self.child_named(&current.id, name)?;
        }

        trace!("Resolved '{}' to object {}", path, current.id);
        Some(current)
    }

    fn list_children(&self, object_id: &str) -> Result<Vec<DeviceObject>> {
        unsafe {
            let parent_wide = wide(object_id);
            let enum_objects: IEnumPortableDeviceObjectIDs = self
                .content
                .EnumObjects(0, PCWSTR(parent_wide.as_ptr()), None)
                .map_err(|e| {
                    MediaToolError::Device(format!(
                        "Failed to enumerate objects in '{}': {}",
                        object_id, e
                    ))
                })?;

            let mut objects = Vec::new();
            loop {
                let mut object_ids: [PWSTR; 100] = [PWSTR::null(); 100];
                let mut fetched: u32 = 0;
                let result = enum_objects.Next(&mut object_ids, &mut fetched as *mut u32);

                if fetched == 0 {
                    break;
                }

                for object_id_ptr in object_ids.iter().take(fetched as usize) {
                    if object_id_ptr.is_null() {
                        continue;
                    }
                    let child_id = object_id_ptr.to_string().unwrap_or_default();
                    CoTaskMemFree(Some(object_id_ptr.0 as *const _));

                    match self.read_object(&child_id) {
                        Ok(object) => objects.push(object),
                        Err(e) => warn!("Failed to get properties for object '{}': {}", child_id, e),
                    }
                }

                if result.is_err() {
                    break;
                }
            }

            trace!("Found {} objects in '{}'", objects.len(), object_id);
            Ok(objects)
        }
    }

    fn open_reader(&self, object_id: &str) -> Result<Box<dyn Read + '_>> {
        unsafe {
            let id_wide = wide(object_id);
            let mut optimal_buffer_size: u32 = 0;
            let mut stream: Option<IStream> = None;

            self.resources
                .GetStream(
                    PCWSTR(id_wide.as_ptr()),
                    &WPD_RESOURCE_DEFAULT,
                    0, // STGM_READ
                    &mut optimal_buffer_size,
                    &mut stream,
                )
                .map_err(|e| MediaToolError::Transfer {
                    path: object_id.to_string(),
                    message: format!("Failed to get file stream: {}", e),
                })?;

            let stream = stream.ok_or_else(|| MediaToolError::Transfer {
                path: object_id.to_string(),
                message: "device returned no stream".to_string(),
            })?;

            let chunk = match optimal_buffer_size as usize {
                0 => DEFAULT_BUFFER_SIZE,
                n => n.min(1024 * 1024),
            };
            Ok(Box::new(StreamReader { stream, chunk }))
        }
    }

    fn delete(&self, object_id: &str) -> Result<()> {
        unsafe {
            let ids: IPortableDevicePropVariantCollection = CoCreateInstance(
                &PortableDevicePropVariantCollection,
                None,
                CLSCTX_INPROC_SERVER,
            )?;
            ids.Add(&PROPVARIANT::from(object_id))?;
            ids.ChangeType(VT_LPWSTR.0)?;

            self.content
                .Delete(0, &ids, None)
                .map_err(|e| MediaToolError::Delete {
                    path: object_id.to_string(),
                    message: e.to_string(),
                })
        }
    }
}

impl Drop for WpdDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.Close();
        }
    }
}

/// `Read` adapter over a WPD resource stream
struct StreamReader {
    stream: IStream,
    chunk: usize,
}

impl Read for StreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.chunk) as u32;
        let mut bytes_read: u32 = 0;
        let hr = unsafe {
            self.stream
                .Read(buf.as_mut_ptr() as *mut _, len, Some(&mut bytes_read))
        };
        if hr.is_err() && bytes_read == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, hr.message()));
        }
        Ok(bytes_read as usize)
    }
}
