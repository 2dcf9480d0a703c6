//! Device session: library lifetime, device enumeration and the per-device cycle
//!
//! A session initializes the device library, creates a timestamped staging
//! root below the target directory and drains devices one at a time:
//! list the tree, build the plan, copy, then delete the originals unless the
//! run is a dry run. The library is torn down when the session is dropped,
//! whatever happened before.
//!
//! Only library initialization and staging-root creation fail the session.
//! Device and file level failures are logged and enumeration carries on.

use crate::core::cleanup::{remove_copied, CleanupStats};
use crate::core::error::{MediaToolError, Result};
use crate::core::plan::{format_size, ExecutionPlan};
use crate::core::progress::ProgressRenderer;
use crate::core::transfer::{copy_plan, TransferStats};
use crate::core::tree::TreeWalker;
use crate::device::filters::{DeviceFilter, LabelContains};
use crate::device::traits::{normalize_device_path, DeviceLibrary};
use chrono::Local;
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Format of the staging root directory name
const STAGING_DIR_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Which attached devices a session drains
#[derive(Debug)]
pub enum DeviceSelection {
    /// Every device that can be opened
    All,
    /// The first device accepted by the filter
    Matching(Box<dyn DeviceFilter>),
}

impl DeviceSelection {
    /// Devices whose label contains `substring`
    pub fn label_contains(substring: &str) -> Self {
        DeviceSelection::Matching(Box::new(LabelContains(substring.to_string())))
    }

    /// Parse a command-line filter: `all` (any case) or a label substring
    pub fn from_filter_arg(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case("all") {
            DeviceSelection::All
        } else {
            Self::label_contains(arg)
        }
    }
}

impl fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelection::All => write!(f, "all devices"),
            DeviceSelection::Matching(filter) => write!(f, "{:?}", filter),
        }
    }
}

/// Input of one import run
#[derive(Debug)]
pub struct ImportRequest {
    pub selection: DeviceSelection,
    /// Device-relative directory to drain, e.g. `DCIM/100GOPRO`
    pub device_dir: String,
    /// Local directory the staging root is created in
    pub target_dir: PathBuf,
    /// Copy only, never delete originals
    pub dry_run: bool,
}

/// Lifecycle of a [`DeviceSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Scanning,
    Transferring,
    CleaningUp,
    Closed,
}

/// What happened on one drained device
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub index: usize,
    pub label: String,
    pub staging_dir: PathBuf,
    pub files_planned: usize,
    pub bytes_planned: u64,
    pub transfer: TransferStats,
    /// `None` when the cleanup pass did not run (dry run or nothing planned)
    pub cleanup: Option<CleanupStats>,
}

/// Result of a successful import run
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Staging root for all-devices runs, the matched device's directory otherwise
    pub staging_dir: PathBuf,
    /// Timestamped directory holding every per-device directory
    pub staging_root: PathBuf,
    pub devices: Vec<DeviceReport>,
    /// `Closed` once the device library has been released
    pub state: SessionState,
}

/// An attached device as reported by the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub description: String,
    pub label: String,
}

/// Plan summary of one scanned device
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub index: usize,
    pub label: String,
    pub files: usize,
    pub total_size: u64,
}

/// Display label of a device: `MTP#<index> - '<name> (<description>)'`
pub fn device_label(index: usize, name: &str, description: &str) -> String {
    format!("MTP#{} - '{} ({})'", index, name, description)
}

/// Name of the staging root for a run started now
pub fn staging_root_name() -> String {
    Local::now().format(STAGING_DIR_FORMAT).to_string()
}

/// Scoped ownership of an initialized device library
///
/// Teardown runs exactly once, when the guard is dropped, including when
/// initialization itself failed.
struct LibraryGuard<'a, L: DeviceLibrary> {
    library: &'a mut L,
}

impl<'a, L: DeviceLibrary> LibraryGuard<'a, L> {
    fn init(library: &'a mut L) -> Result<Self> {
        let mut guard = Self { library };
        guard.library.init()?;
        debug!("Device library initialized");
        Ok(guard)
    }
}

impl<L: DeviceLibrary> Drop for LibraryGuard<'_, L> {
    fn drop(&mut self) {
        self.library.teardown();
        debug!("Device library released");
    }
}

/// One attempt to drain a class of devices
pub struct DeviceSession<'a, L: DeviceLibrary> {
    guard: LibraryGuard<'a, L>,
    walker: &'a TreeWalker,
    progress: &'a mut dyn ProgressRenderer,
    staging_root: PathBuf,
    dry_run: bool,
    state: SessionState,
    current: Option<(usize, String)>,
    reports: Vec<DeviceReport>,
}

impl<'a, L: DeviceLibrary> DeviceSession<'a, L> {
    /// Initialize the library and create the staging root below `target_dir`
    pub fn open(
        library: &'a mut L,
        walker: &'a TreeWalker,
        progress: &'a mut dyn ProgressRenderer,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<Self> {
        let guard = LibraryGuard::init(library)?;

        let staging_root = target_dir.join(staging_root_name());
        fs::create_dir_all(&staging_root).map_err(|e| {
            MediaToolError::Io(format!(
                "Failed to create staging directory '{}': {}",
                staging_root.display(),
                e
            ))
        })?;
        debug!("Staging root: {}", staging_root.display());

        Ok(Self {
            guard,
            walker,
            progress,
            staging_root,
            dry_run,
            state: SessionState::Initialized,
            current: None,
            reports: Vec::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Index and label of the device currently being processed
    pub fn current_device(&self) -> Option<(usize, &str)> {
        self.current.as_ref().map(|(i, label)| (*i, label.as_str()))
    }

    pub fn reports(&self) -> &[DeviceReport] {
        &self.reports
    }

    /// Drain every device that can be opened; returns the staging root
    pub fn drain_all(&mut self, device_dir: &str) -> PathBuf {
        let count = self.guard.library.device_count();
        for index in 0..count {
            let Some(handle) = self.select(index) else {
                continue;
            };
            self.drain_device(index, &handle, device_dir);
        }
        self.staging_root.clone()
    }

    /// Drain the first device accepted by `filter`; returns its staging directory
    ///
    /// Devices after the match are enumerated but neither opened nor drained.
    pub fn drain_first_match(
        &mut self,
        filter: &dyn DeviceFilter,
        device_dir: &str,
    ) -> Result<PathBuf> {
        let count = self.guard.library.device_count();
        let mut matched: Option<PathBuf> = None;

        for index in 0..count {
            if matched.is_some() {
                info!(
                    "Skipping {} because a matching device was already imported",
                    self.label_of(index)
                );
                continue;
            }

            let Some(handle) = self.select(index) else {
                continue;
            };

            let label = self.label_of(index);
            if !filter.accept(index, &handle, &label) {
                info!("Skipping {} because it does not match the filter", label);
                continue;
            }

            if let Some(report) = self.drain_device(index, &handle, device_dir) {
                matched = Some(report.staging_dir.clone());
            }
        }

        matched.ok_or_else(|| MediaToolError::NoMatchingDevice(format!("{:?}", filter)))
    }

    fn label_of(&self, index: usize) -> String {
        let library = &self.guard.library;
        device_label(
            index,
            &library.device_name(index),
            &library.device_description(index),
        )
    }

    fn select(&mut self, index: usize) -> Option<L::Handle> {
        let label = self.label_of(index);
        info!("Found {} device", label);
        self.current = Some((index, label.clone()));

        match self.guard.library.select_device(index) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Unable to read {}: {}", label, e);
                None
            }
        }
    }

    /// Release the device library and report the run
    pub fn close(self, staging_dir: PathBuf) -> ImportOutcome {
        let DeviceSession {
            guard,
            staging_root,
            reports,
            ..
        } = self;
        drop(guard);

        ImportOutcome {
            staging_dir,
            staging_root,
            devices: reports,
            state: SessionState::Closed,
        }
    }

    /// Scan, transfer and clean up one opened device
    fn drain_device(
        &mut self,
        index: usize,
        handle: &L::Handle,
        device_dir: &str,
    ) -> Option<&DeviceReport> {
        let label = self.label_of(index);
        let staging_dir = self.staging_root.join(index.to_string());
        if let Err(e) = fs::create_dir_all(&staging_dir) {
            warn!(
                "Unable to create '{}' temp directory ({}). {} was skipped",
                staging_dir.display(),
                e,
                label
            );
            return None;
        }

        self.state = SessionState::Scanning;
        info!("Scanning {}...", label);
        let root_path = normalize_device_path(device_dir);
        let mut tree = self.walker.walk(handle, &root_path);
        let plan = ExecutionPlan::build(&tree);

        let mut report = DeviceReport {
            index,
            label,
            staging_dir,
            files_planned: plan.files_count(),
            bytes_planned: plan.total_size(),
            transfer: TransferStats::default(),
            cleanup: None,
        };

        if plan.is_empty() {
            info!("Nothing to import from {} under {}", report.label, root_path);
        } else {
            info!(
                "{} file(s) ({}) will be downloaded to '{}' temp directory",
                plan.files_count(),
                plan.total_size_string(),
                report.staging_dir.display()
            );

            self.state = SessionState::Transferring;
            report.transfer = copy_plan(
                handle,
                &mut tree,
                &plan,
                &report.staging_dir,
                &mut *self.progress,
            );

            if self.dry_run {
                info!("Source files will not be removed (dry run)");
            } else {
                self.state = SessionState::CleaningUp;
                info!("Deleting origin files from {}", report.label);
                report.cleanup = Some(remove_copied(handle, &tree, &mut *self.progress));
            }
        }

        self.state = SessionState::Initialized;
        self.reports.push(report);
        self.reports.last()
    }
}

/// Run one import: open a session, drain the selected devices, release the library
///
/// All-devices runs return the staging root; filtered runs return the
/// matched device's staging directory or [`MediaToolError::NoMatchingDevice`].
pub fn import_from_devices<L: DeviceLibrary>(
    library: &mut L,
    request: &ImportRequest,
    walker: &TreeWalker,
    progress: &mut dyn ProgressRenderer,
) -> Result<ImportOutcome> {
    let mut session = DeviceSession::open(
        library,
        walker,
        progress,
        &request.target_dir,
        request.dry_run,
    )?;

    let staging_dir = match &request.selection {
        DeviceSelection::All => session.drain_all(&request.device_dir),
        DeviceSelection::Matching(filter) => {
            session.drain_first_match(filter.as_ref(), &request.device_dir)?
        }
    };

    for report in session.reports() {
        info!(
            "{}: {} planned ({}), {}",
            report.label,
            report.files_planned,
            format_size(report.bytes_planned),
            report.transfer
        );
    }

    Ok(session.close(staging_dir))
}

/// Enumerate attached devices
pub fn list_devices<L: DeviceLibrary>(library: &mut L) -> Result<Vec<DeviceInfo>> {
    let guard = LibraryGuard::init(library)?;
    let library = &guard.library;

    Ok((0..library.device_count())
        .map(|index| {
            let name = library.device_name(index);
            let description = library.device_description(index);
            DeviceInfo {
                index,
                label: device_label(index, &name, &description),
                name,
                description,
            }
        })
        .collect())
}

/// List and plan the selected devices without copying anything
///
/// Every accepted device is reported, not only the first.
pub fn scan_devices<L: DeviceLibrary>(
    library: &mut L,
    selection: &DeviceSelection,
    device_dir: &str,
    walker: &TreeWalker,
) -> Result<Vec<ScanReport>> {
    let mut guard = LibraryGuard::init(library)?;
    let root_path = normalize_device_path(device_dir);
    let mut reports = Vec::new();

    for index in 0..guard.library.device_count() {
        let label = device_label(
            index,
            &guard.library.device_name(index),
            &guard.library.device_description(index),
        );
        let handle = match guard.library.select_device(index) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Unable to read {}: {}", label, e);
                continue;
            }
        };

        if let DeviceSelection::Matching(filter) = selection {
            if !filter.accept(index, &handle, &label) {
                debug!("Skipping {} because it does not match the filter", label);
                continue;
            }
        }

        let tree = walker.walk(&handle, &root_path);
        let plan = ExecutionPlan::build(&tree);
        reports.push(ScanReport {
            index,
            label,
            files: plan.files_count(),
            total_size: plan.total_size(),
        });
    }

    Ok(reports)
}
