//! Predefined device setups and end-to-end session scenarios
//!
//! Each [`ScenarioLibrary`] constructor returns a ready [`MockDeviceLibrary`]
//! describing one kind of rig that shows up on an import desk.

use super::mock_device::{MockDevice, MockDeviceLibrary, MockEntry};

/// Collection of predefined device setups
pub struct ScenarioLibrary;

impl ScenarioLibrary {
    // =========================================================================
    // SINGLE DEVICES
    // =========================================================================

    /// A GoPro with two photos and a clip, plus the usual system folders
    pub fn gopro_camera() -> MockDevice {
        let mut device = MockDevice::new("HERO9 Black", "GoPro");
        device.add(MockEntry::file("/DCIM/100GOPRO/GOPR0001.JPG", &[1u8; 120]));
        device.add(MockEntry::file("/DCIM/100GOPRO/GOPR0002.JPG", &[2u8; 80]));
        device.add(MockEntry::sized_file("/DCIM/100GOPRO/GX010001.MP4", 4096));
        device.add(MockEntry::file("/MISC/version.txt", b"HD9.01"));
        device.add(MockEntry::file("/System Volume Information/IndexerVolumeGuid", b"g"));
        device.add(MockEntry::folder("/$RECYCLE.BIN"));
        device
    }

    /// A Panasonic camcorder with AVCHD streams
    pub fn camcorder() -> MockDevice {
        let mut device = MockDevice::new("HC-V770", "CAM");
        device.add(MockEntry::sized_file("/PRIVATE/AVCHD/BDMV/STREAM/00000.MTS", 2048));
        device.add(MockEntry::sized_file("/PRIVATE/AVCHD/BDMV/STREAM/00001.MTS", 1024));
        device.add(MockEntry::file("/PRIVATE/AVCHD/BDMV/INDEX.BDM", b"idx"));
        device
    }

    /// A plain SD card from a compact camera
    pub fn sd_card() -> MockDevice {
        let mut device = MockDevice::new("Removable", "USB");
        device.add(MockEntry::file("/DCIM/100CANON/IMG_0001.JPG", &[3u8; 300]));
        device.add(MockEntry::file("/DCIM/100CANON/IMG_0002.JPG", &[4u8; 200]));
        device.add(MockEntry::file("/DCIM/100CANON/MVI_0003.MP4", &[5u8; 100]));
        device.add(MockEntry::file("/DCIM/$RECYCLE.BIN/IMG_0000.JPG", b"x"));
        device
    }

    /// A phone-like device without any camera folder
    pub fn empty_device() -> MockDevice {
        let mut device = MockDevice::new("Pixel 7", "Android");
        device.add(MockEntry::folder("/Download"));
        device
    }

    // =========================================================================
    // RIGS
    // =========================================================================

    /// SD card, GoPro and camcorder, attached in that order
    pub fn mixed_rig() -> MockDeviceLibrary {
        let mut library = MockDeviceLibrary::new();
        library.attach(Self::sd_card());
        library.attach(Self::gopro_camera());
        library.attach(Self::camcorder());
        library
    }

    /// Three devices where only index 1 carries "GoPro" in its label
    pub fn three_devices_one_gopro() -> MockDeviceLibrary {
        let mut library = MockDeviceLibrary::new();
        library.attach(Self::empty_device());
        library.attach(Self::gopro_camera());
        library.attach(Self::sd_card());
        library
    }

    /// Two SD cards, the first one refuses to open
    pub fn busy_reader() -> MockDeviceLibrary {
        let mut library = MockDeviceLibrary::new();
        library.attach(Self::sd_card());
        library.attach(Self::sd_card());
        library.fail_select(0);
        library
    }

    /// No WPD support at all
    pub fn broken_library() -> MockDeviceLibrary {
        let mut library = MockDeviceLibrary::new();
        library.attach(Self::sd_card());
        library.fail_init("CoInitializeEx failed");
        library
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cleanup::remove_copied;
    use crate::core::error::MediaToolError;
    use crate::core::plan::ExecutionPlan;
    use crate::core::progress::{NoProgress, ProgressPhase};
    use crate::core::session::{import_from_devices, DeviceSelection, ImportRequest};
    use crate::core::tree::{DeviceTree, TreeWalker};
    use crate::device::filters;
    use crate::device::traits::DeviceObject;
    use crate::testdb::mock_device::LibraryCall;
    use crate::testdb::RecordingProgress;
    use std::path::Path;

    fn request(selection: DeviceSelection, device_dir: &str, target: &Path, dry_run: bool) -> ImportRequest {
        ImportRequest {
            selection,
            device_dir: device_dir.to_string(),
            target_dir: target.to_path_buf(),
            dry_run,
        }
    }

    #[test]
    fn scenario_a_single_file_plan() {
        let mut tree = DeviceTree::new("/DCIM");
        tree.insert(None, DeviceObject::file("o1", "a.jpg", 100));

        let plan = ExecutionPlan::build(&tree);
        assert_eq!(plan.total_size_string(), "100 B");
        assert_eq!(plan.files_count(), 1);
    }

    #[test]
    fn scenario_b_bytes_remaining_sequence() {
        let mut tree = DeviceTree::new("/DCIM");
        for (i, size) in [100u64, 200, 300].iter().enumerate() {
            let name = format!("f{}.jpg", i);
            tree.insert(None, DeviceObject::file(&name, &name, *size));
        }
        let plan = ExecutionPlan::build(&tree);
        assert_eq!(plan.total_size(), 600);

        let mut it = plan.iter();
        let mut remaining = Vec::new();
        for _ in 0..3 {
            it.next();
            remaining.push(it.bytes_remaining());
        }
        assert_eq!(remaining, vec![500, 300, 0]);
        assert!(!it.has_next());
    }

    #[test]
    fn scenario_c_cleanup_deletes_only_flagged() {
        let mut device = MockDevice::new("Card", "SD");
        device.add(MockEntry::file("/DCIM/100CANON/copied.jpg", b"c"));
        device.add(MockEntry::file("/DCIM/100CANON/kept.jpg", b"k"));

        let mut tree = TreeWalker::default().walk(&device, "/DCIM");
        let copied = tree
            .nodes()
            .find(|(_, n)| n.name == "copied.jpg")
            .map(|(id, _)| id)
            .unwrap();
        tree.mark_copied(copied);

        let stats = remove_copied(&device, &tree, &mut NoProgress);

        assert_eq!(device.deleted(), vec!["/DCIM/100CANON/copied.jpg"]);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.skipped, 1);
        assert!(device.exists("/DCIM/100CANON"));
    }

    #[test]
    fn scenario_d_dry_run_copies_without_cleanup() {
        let mut library = MockDeviceLibrary::new();
        let device = library.attach(ScenarioLibrary::sd_card());
        let target = tempfile::tempdir().unwrap();
        let mut progress = RecordingProgress::default();

        let outcome = import_from_devices(
            &mut library,
            &request(DeviceSelection::All, "DCIM", target.path(), true),
            &TreeWalker::default(),
            &mut progress,
        )
        .unwrap();

        let report = &outcome.devices[0];
        assert_eq!(report.files_planned, 3);
        assert_eq!(report.transfer.files_copied, 3);
        assert!(report.cleanup.is_none());
        assert!(device.deleted().is_empty());
        assert!(device.exists("/DCIM/100CANON/IMG_0001.JPG"));
        assert!(progress.events_for(ProgressPhase::Deleting).is_empty());
        assert_eq!(progress.finished, vec![ProgressPhase::Copying]);
        assert!(outcome
            .staging_dir
            .join("0")
            .join("100CANON")
            .join("IMG_0002.JPG")
            .exists());
    }

    #[test]
    fn scenario_e_filtered_enumeration_picks_index_one() {
        let mut library = ScenarioLibrary::three_devices_one_gopro();
        let target = tempfile::tempdir().unwrap();

        let outcome = import_from_devices(
            &mut library,
            &request(
                DeviceSelection::label_contains("GoPro"),
                "DCIM/100GOPRO",
                target.path(),
                false,
            ),
            &TreeWalker::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(library.selected(), vec![0, 1]);
        assert_eq!(outcome.devices.len(), 1);
        assert_eq!(outcome.devices[0].index, 1);
        assert_eq!(outcome.staging_dir.file_name().unwrap(), "1");
        assert_eq!(
            outcome.staging_dir.parent(),
            Some(outcome.staging_root.as_path())
        );
        assert!(outcome.staging_dir.join("GOPR0001.JPG").exists());
        assert!(outcome.staging_dir.join("GX010001.MP4").exists());

        assert_eq!(library.device(1).deleted().len(), 3);
        assert!(library.device(0).reads().is_empty());
        assert!(library.device(2).reads().is_empty());
        assert!(library.device(2).deleted().is_empty());
        assert_eq!(library.calls().last(), Some(&LibraryCall::Teardown));
    }

    #[test]
    fn ignored_names_are_never_listed_on_any_device() {
        let library = ScenarioLibrary::mixed_rig();
        let walker = TreeWalker::default();

        for index in 0..3 {
            let device = library.device(index);
            let tree = walker.walk(&*device, "/");
            assert!(tree
                .nodes()
                .all(|(_, n)| n.name != "$RECYCLE.BIN" && n.name != "System Volume Information"));
        }
    }

    #[test]
    fn presets_pick_the_right_device_class() {
        let target = tempfile::tempdir().unwrap();

        let mut library = ScenarioLibrary::mixed_rig();
        let outcome = import_from_devices(
            &mut library,
            &request(
                DeviceSelection::Matching(filters::camcorder()),
                "PRIVATE/AVCHD/BDMV/STREAM",
                target.path(),
                true,
            ),
            &TreeWalker::default(),
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(outcome.devices[0].index, 2);
        assert_eq!(outcome.devices[0].transfer.bytes_copied, 3072);

        let mut library = ScenarioLibrary::mixed_rig();
        let outcome = import_from_devices(
            &mut library,
            &request(
                DeviceSelection::Matching(filters::sd_card()),
                "DCIM",
                target.path(),
                true,
            ),
            &TreeWalker::default(),
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(outcome.devices[0].index, 0);
        assert_eq!(outcome.devices[0].files_planned, 3);
    }

    #[test]
    fn selection_failure_moves_on_to_next_device() {
        let mut library = ScenarioLibrary::busy_reader();
        let target = tempfile::tempdir().unwrap();

        let outcome = import_from_devices(
            &mut library,
            &request(DeviceSelection::label_contains("USB"), "DCIM", target.path(), false),
            &TreeWalker::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(outcome.devices[0].index, 1);
        assert!(library.device(0).deleted().is_empty());
        assert_eq!(library.device(1).deleted().len(), 3);
    }

    #[test]
    fn library_is_released_when_init_fails() {
        let mut library = ScenarioLibrary::broken_library();
        let target = tempfile::tempdir().unwrap();

        let result = import_from_devices(
            &mut library,
            &request(DeviceSelection::All, "DCIM", target.path(), false),
            &TreeWalker::default(),
            &mut NoProgress,
        );

        assert!(matches!(result, Err(MediaToolError::LibraryInit(_))));
        assert_eq!(library.teardown_count(), 1);
        assert!(library.selected().is_empty());
    }

    #[test]
    fn failed_copy_is_never_deleted() {
        let mut device = ScenarioLibrary::gopro_camera();
        device.fail_reading("/DCIM/100GOPRO/GOPR0002.JPG");
        let mut library = MockDeviceLibrary::new();
        let device = library.attach(device);
        let target = tempfile::tempdir().unwrap();

        let outcome = import_from_devices(
            &mut library,
            &request(DeviceSelection::All, "DCIM", target.path(), false),
            &TreeWalker::default(),
            &mut NoProgress,
        )
        .unwrap();

        let report = &outcome.devices[0];
        assert_eq!(report.transfer.errors, 1);
        let cleanup = report.cleanup.as_ref().unwrap();
        assert_eq!(cleanup.deleted, 2);
        assert_eq!(cleanup.skipped, 1);
        assert!(device.exists("/DCIM/100GOPRO/GOPR0002.JPG"));
        assert!(!device.deleted().contains(&"/DCIM/100GOPRO/GOPR0002.JPG".to_string()));
    }
}
