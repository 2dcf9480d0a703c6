//! Transfer pass: copy every planned file into the staging directory
//!
//! Files are re-rooted under the destination by their path relative to the
//! plan's device root. A file is flagged as copied only when the number of
//! bytes written matches the size reported by the device. Per-file failures
//! are logged and never stop the batch.

use crate::core::error::{MediaToolError, Result};
use crate::core::plan::{format_size, ExecutionPlan};
use crate::core::progress::{ProgressEvent, ProgressPhase, ProgressRenderer};
use crate::core::tree::{DeviceNode, DeviceTree};
use crate::device::traits::{device_path_components, DeviceHandle};
use filetime::FileTime;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Statistics about one transfer pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferStats {
    pub files_copied: usize,
    pub errors: usize,
    pub bytes_copied: u64,
}

impl std::fmt::Display for TransferStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Copied: {}, Errors: {}, Total size: {}",
            self.files_copied,
            self.errors,
            format_size(self.bytes_copied)
        )
    }
}

/// Reader adapter that reports every chunk read
pub struct ProgressReader<R, F> {
    inner: R,
    on_read: F,
}

impl<R: Read, F: FnMut(u64)> ProgressReader<R, F> {
    pub fn new(inner: R, on_read: F) -> Self {
        Self { inner, on_read }
    }
}

impl<R: Read, F: FnMut(u64)> Read for ProgressReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            (self.on_read)(n as u64);
        }
        Ok(n)
    }
}

/// Path of `path` relative to `root`, both device paths
///
/// Falls back to the absolute device path when `path` is not below `root`.
pub fn relative_device_path(path: &str, root: &str) -> String {
    let path_parts: Vec<&str> = device_path_components(path).collect();
    let root_parts: Vec<&str> = device_path_components(root).collect();

    if path_parts.len() > root_parts.len() && path_parts.starts_with(&root_parts) {
        path_parts[root_parts.len()..].join("/")
    } else {
        debug!(
            "Unable to calculate relative path for {} regarding {}",
            path, root
        );
        path.to_string()
    }
}

/// Local destination for a device-relative path
///
/// Every component is appended below `dest_root`, so an absolute fallback
/// path still lands inside the staging directory.
pub fn destination_path(dest_root: &Path, relative: &str) -> PathBuf {
    device_path_components(relative)
        .filter(|part| *part != "." && *part != "..")
        .fold(dest_root.to_path_buf(), |acc, part| acc.join(part))
}

/// Copy every file of `plan` below `dest_root`
///
/// Marks copied nodes in `tree`, which must be the tree the plan was built from.
pub fn copy_plan<H: DeviceHandle + ?Sized>(
    handle: &H,
    tree: &mut DeviceTree,
    plan: &ExecutionPlan,
    dest_root: &Path,
    progress: &mut dyn ProgressRenderer,
) -> TransferStats {
    let mut stats = TransferStats::default();
    let total_bytes = plan.total_size();

    progress.start(ProgressPhase::Copying, plan.files_count(), total_bytes);

    let mut it = plan.iter();
    while let Some(entry) = it.current() {
        let node = tree.node(entry.node);
        let relative = relative_device_path(&node.path, plan.root_dir());
        let target = destination_path(dest_root, &relative);

        let mut event = ProgressEvent {
            phase: ProgressPhase::Copying,
            current: it.files_seen_count(),
            total: it.files_total(),
            bytes_done: total_bytes - it.bytes_remaining(),
            bytes_total: total_bytes,
            label: relative,
        };
        progress.update(&event);

        debug!("Copying from '{}' to {}...", node.path, target.display());

        let bytes_before = event.bytes_done;
        let result = copy_file(handle, node, &target, |copied| {
            event.bytes_done = bytes_before + copied;
            progress.update(&event);
        });

        match result {
            Ok(bytes) => {
                debug!("Copy of '{}' - done ({})", node.path, format_size(bytes));
                tree.mark_copied(entry.node);
                stats.files_copied += 1;
                stats.bytes_copied += bytes;
            }
            Err(e) => {
                warn!("Copy of '{}' - failed: {}", tree.node(entry.node).path, e);
                stats.errors += 1;
            }
        }

        it.next();
    }

    progress.finish(ProgressPhase::Copying);
    info!("Transfer finished: {}", stats);
    stats
}

/// Stream one file to `target`, returning the number of bytes written
fn copy_file<H: DeviceHandle + ?Sized, F: FnMut(u64)>(
    handle: &H,
    node: &DeviceNode,
    target: &Path,
    mut on_progress: F,
) -> Result<u64> {
    let transfer_error = |message: String| MediaToolError::Transfer {
        path: node.path.clone(),
        message,
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            transfer_error(format!(
                "Failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let reader = handle.open_reader(&node.object.id)?;

    let mut file = File::create(target).map_err(|e| {
        transfer_error(format!(
            "Failed to create file '{}': {}",
            target.display(),
            e
        ))
    })?;

    let mut copied_so_far = 0u64;
    let mut reader = ProgressReader::new(reader, |n| {
        copied_so_far += n;
        on_progress(copied_so_far);
    });

    let written = io::copy(&mut reader, &mut file)
        .and_then(|n| file.flush().map(|_| n))
        .map_err(|e| transfer_error(e.to_string()))
        .and_then(|copied| {
            if copied == node.size() {
                Ok(copied)
            } else {
                Err(MediaToolError::SizeMismatch {
                    path: node.path.clone(),
                    expected: node.size(),
                    actual: copied,
                })
            }
        });
    drop(file);

    let copied = match written {
        Ok(copied) => copied,
        Err(e) => {
            discard_partial(target);
            return Err(e);
        }
    };

    if let Some(modified) = node.object.modified {
        let mtime = FileTime::from_unix_time(modified.timestamp(), modified.timestamp_subsec_nanos());
        if let Err(e) = filetime::set_file_mtime(target, mtime) {
            warn!(
                "Unable to set modification time of '{}': {}",
                target.display(),
                e
            );
        }
    }

    Ok(copied)
}

/// Remove an incomplete target so later passes never pick it up
fn discard_partial(target: &Path) {
    match fs::remove_file(target) {
        Ok(()) => debug!("Removed incomplete copy '{}'", target.display()),
        Err(e) => warn!(
            "Unable to remove incomplete copy '{}': {}",
            target.display(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::NoProgress;
    use crate::core::tree::TreeWalker;
    use crate::testdb::mock_device::{MockDevice, MockEntry};
    use crate::testdb::RecordingProgress;
    use chrono::{TimeZone, Utc};

    fn camera() -> MockDevice {
        let mut device = MockDevice::new("HERO9 Black", "GoPro");
        device.add(MockEntry::file("/DCIM/100GOPRO/GOPR0001.JPG", b"first"));
        device.add(MockEntry::file("/DCIM/100GOPRO/GOPR0002.JPG", b"second!"));
        device.add(MockEntry::file("/DCIM/101GOPRO/GX010001.MP4", &[7u8; 300]));
        device
    }

    #[test]
    fn test_relative_device_path() {
        assert_eq!(
            relative_device_path("/DCIM/100GOPRO/a.jpg", "/DCIM"),
            "100GOPRO/a.jpg"
        );
        assert_eq!(relative_device_path("/DCIM/a.jpg", "/"), "DCIM/a.jpg");
        assert_eq!(
            relative_device_path("/MISC/a.jpg", "/DCIM"),
            "/MISC/a.jpg"
        );
        assert_eq!(relative_device_path("/DCIMX/a.jpg", "/DCIM"), "/DCIMX/a.jpg");
    }

    #[test]
    fn test_destination_path_stays_below_root() {
        let root = Path::new("/tmp/staging/0");
        assert_eq!(
            destination_path(root, "100GOPRO/a.jpg"),
            root.join("100GOPRO").join("a.jpg")
        );
        assert_eq!(
            destination_path(root, "/MISC/a.jpg"),
            root.join("MISC").join("a.jpg")
        );
        assert_eq!(destination_path(root, "../a.jpg"), root.join("a.jpg"));
    }

    #[test]
    fn test_copy_plan_copies_and_marks() {
        let device = camera();
        let staging = tempfile::tempdir().unwrap();

        let mut tree = TreeWalker::default().walk(&device, "/DCIM");
        let plan = ExecutionPlan::build(&tree);
        let stats = copy_plan(&device, &mut tree, &plan, staging.path(), &mut NoProgress);

        assert_eq!(stats.files_copied, 3);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.bytes_copied, 312);
        assert_eq!(
            fs::read(staging.path().join("100GOPRO").join("GOPR0002.JPG")).unwrap(),
            b"second!"
        );
        assert!(staging.path().join("101GOPRO").join("GX010001.MP4").exists());
        assert!(plan
            .entries()
            .iter()
            .all(|e| tree.node(e.node).was_copied()));
    }

    #[test]
    fn test_copy_plan_applies_modification_time() {
        let modified = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let mut device = MockDevice::new("Card", "SD");
        device.add(MockEntry::file("/DCIM/a.jpg", b"abc").with_modified(modified));
        let staging = tempfile::tempdir().unwrap();

        let mut tree = TreeWalker::default().walk(&device, "/DCIM");
        let plan = ExecutionPlan::build(&tree);
        copy_plan(&device, &mut tree, &plan, staging.path(), &mut NoProgress);

        let metadata = fs::metadata(staging.path().join("a.jpg")).unwrap();
        let mtime = FileTime::from_last_modification_time(&metadata);
        assert_eq!(mtime.unix_seconds(), modified.timestamp());
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let mut device = camera();
        device.fail_reading("/DCIM/100GOPRO/GOPR0001.JPG");
        device.add(
            MockEntry::file("/DCIM/101GOPRO/SHORT.JPG", b"abc").with_reported_size(10),
        );
        let staging = tempfile::tempdir().unwrap();

        let mut tree = TreeWalker::default().walk(&device, "/DCIM");
        let plan = ExecutionPlan::build(&tree);
        let stats = copy_plan(&device, &mut tree, &plan, staging.path(), &mut NoProgress);

        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.errors, 2);
        for entry in plan.entries() {
            let node = tree.node(entry.node);
            let expected = node.name != "GOPR0001.JPG" && node.name != "SHORT.JPG";
            assert_eq!(node.was_copied(), expected, "{}", node.path);
        }
        assert!(!staging.path().join("100GOPRO").join("GOPR0001.JPG").exists());
    }

    #[test]
    fn test_short_copy_leaves_nothing_behind() {
        let mut device = MockDevice::new("Card", "SD");
        device.add(MockEntry::file("/DCIM/TRUNC.JPG", b"abc").with_reported_size(10));
        device.add(MockEntry::file("/DCIM/FULL.JPG", b"full"));
        let staging = tempfile::tempdir().unwrap();

        let mut tree = TreeWalker::default().walk(&device, "/DCIM");
        let plan = ExecutionPlan::build(&tree);
        let stats = copy_plan(&device, &mut tree, &plan, staging.path(), &mut NoProgress);

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.files_copied, 1);
        assert!(!staging.path().join("TRUNC.JPG").exists());
        assert_eq!(fs::read(staging.path().join("FULL.JPG")).unwrap(), b"full");
    }

    #[test]
    fn test_progress_events() {
        let device = camera();
        let staging = tempfile::tempdir().unwrap();
        let mut progress = RecordingProgress::default();

        let mut tree = TreeWalker::default().walk(&device, "/DCIM");
        let plan = ExecutionPlan::build(&tree);
        copy_plan(&device, &mut tree, &plan, staging.path(), &mut progress);

        assert_eq!(progress.started, vec![(ProgressPhase::Copying, 3, 312)]);
        assert_eq!(progress.finished, vec![ProgressPhase::Copying]);

        let first = &progress.events[0];
        assert_eq!(first.current, 1);
        assert_eq!(first.total, 3);
        assert_eq!(first.bytes_done, 0);
        assert_eq!(first.label, "100GOPRO/GOPR0001.JPG");

        let last = progress.events.last().unwrap();
        assert_eq!(last.current, 3);
        assert_eq!(last.bytes_done, 312);
        assert!(progress
            .events
            .windows(2)
            .all(|w| w[0].bytes_done <= w[1].bytes_done));
    }
}
