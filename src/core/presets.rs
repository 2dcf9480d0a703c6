//! Import sources known to the CLI
//!
//! Each source names the device class to drain, the device folder holding
//! its media and the exiftool passes that move staged files into the dated
//! target layout.

use crate::core::exiftool::ExifArgs;
use crate::core::session::DeviceSelection;
use crate::device::filters::{self, CAM_FILES_DIR, DCIM_DIR, GOPRO_DIR};
use std::path::Path;

/// Which files a rename pass touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Images,
    Mp4,
    Avchd,
    ImagesAndMp4,
}

impl MediaKind {
    /// Limit `args` to the extensions of this kind
    pub fn restrict(self, args: &mut ExifArgs) {
        match self {
            MediaKind::Images => args.for_images(),
            MediaKind::Mp4 => args.for_video_mp4(),
            MediaKind::Avchd => args.for_video_avchd(),
            MediaKind::ImagesAndMp4 => args.for_images().for_video_mp4(),
        };
    }
}

/// One exiftool run over the staging directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenamePass {
    pub media: MediaKind,
    /// Tag the capture date is read from
    pub date_tag: &'static str,
    /// Target pattern below the target directory, in exiftool `-d` syntax
    pub pattern: &'static str,
}

impl RenamePass {
    /// Arguments renaming staged files into `target_dir`
    ///
    /// A dry run only prints the new names (`TestName`) and leaves file dates alone.
    pub fn exif_args(&self, staging_dir: &Path, target_dir: &Path, dry_run: bool) -> ExifArgs {
        let pattern = target_dir.join(self.pattern).display().to_string();
        let mut args = ExifArgs::default();
        args.rename_by_date(self.date_tag, &pattern, dry_run);
        self.media.restrict(&mut args);
        args.recursively().source(staging_dir);
        args
    }
}

/// A named import source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSource {
    pub name: &'static str,
    pub description: &'static str,
    /// Device folder to drain
    pub device_dir: &'static str,
    pub passes: &'static [RenamePass],
    selection: fn() -> DeviceSelection,
}

const GOPRO_PASSES: &[RenamePass] = &[
    RenamePass {
        media: MediaKind::Images,
        date_tag: "CreateDate",
        pattern: "%Y.%m.%d/src/IMG_%Y%m%d_%H%M%S%%-c.%%e",
    },
    RenamePass {
        media: MediaKind::Mp4,
        date_tag: "CreateDate",
        pattern: "%Y.%m.%d/src/VID_%Y%m%d_%H%M%S%%-c.%%e",
    },
];

const CAMVIDEO_PASSES: &[RenamePass] = &[RenamePass {
    media: MediaKind::Avchd,
    date_tag: "DateTimeOriginal",
    pattern: "%Y.%m.%d/src/VID_%Y%m%d_%H%M%S%%-c.%%e",
}];

const SDPHOTOS_PASSES: &[RenamePass] = &[RenamePass {
    media: MediaKind::ImagesAndMp4,
    date_tag: "CreateDate",
    pattern: "%Y.%m.%d/%%f%%-c.%%e",
}];

fn gopro_selection() -> DeviceSelection {
    DeviceSelection::Matching(filters::gopro())
}

fn camcorder_selection() -> DeviceSelection {
    DeviceSelection::Matching(filters::camcorder())
}

fn all_devices() -> DeviceSelection {
    DeviceSelection::All
}

/// Every import source, in help order
pub const SOURCES: &[ImportSource] = &[
    ImportSource {
        name: "gopro",
        description: "GoPro photos and clips",
        device_dir: GOPRO_DIR,
        passes: GOPRO_PASSES,
        selection: gopro_selection,
    },
    ImportSource {
        name: "camvideo",
        description: "Panasonic camcorder AVCHD video",
        device_dir: CAM_FILES_DIR,
        passes: CAMVIDEO_PASSES,
        selection: camcorder_selection,
    },
    ImportSource {
        name: "sdphotos",
        description: "Photos and video from every attached SD card",
        device_dir: DCIM_DIR,
        passes: SDPHOTOS_PASSES,
        selection: all_devices,
    },
];

impl ImportSource {
    /// Look a source up by name (case-insensitive)
    pub fn named(name: &str) -> Option<ImportSource> {
        SOURCES
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .copied()
    }

    /// Devices this source drains
    pub fn selection(&self) -> DeviceSelection {
        (self.selection)()
    }

    /// Rename passes for a finished staging directory
    pub fn exif_passes(&self, staging_dir: &Path, target_dir: &Path, dry_run: bool) -> Vec<ExifArgs> {
        self.passes
            .iter()
            .map(|p| p.exif_args(staging_dir, target_dir, dry_run))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named() {
        assert_eq!(ImportSource::named("gopro").unwrap().device_dir, "DCIM/100GOPRO");
        assert_eq!(
            ImportSource::named("CamVideo").unwrap().device_dir,
            "PRIVATE/AVCHD/BDMV/STREAM"
        );
        assert_eq!(ImportSource::named("sdphotos").unwrap().device_dir, "DCIM");
        assert!(ImportSource::named("floppy").is_none());
    }

    #[test]
    fn test_selections() {
        assert!(matches!(
            ImportSource::named("sdphotos").unwrap().selection(),
            DeviceSelection::All
        ));
        assert!(matches!(
            ImportSource::named("gopro").unwrap().selection(),
            DeviceSelection::Matching(_)
        ));
    }

    #[test]
    fn test_gopro_passes() {
        let source = ImportSource::named("gopro").unwrap();
        let staging = Path::new("staging");
        let target = Path::new("photos");
        let passes = source.exif_passes(staging, target, false);

        assert_eq!(passes.len(), 2);
        let images = passes[0].as_slice();
        assert_eq!(images[0], "-FileModifyDate<CreateDate");
        assert_eq!(images[1], "-FileCreateDate<CreateDate");
        assert_eq!(images[2], "-FileName<CreateDate");
        assert_eq!(images[3], "-d");
        assert_eq!(
            images[4],
            target
                .join("%Y.%m.%d/src/IMG_%Y%m%d_%H%M%S%%-c.%%e")
                .display()
                .to_string()
        );
        assert!(images.iter().any(|a| a == "jpg"));
        assert_eq!(images[images.len() - 2], "-r");
        assert_eq!(images[images.len() - 1], "staging");

        assert!(passes[1].as_slice().iter().any(|a| a == "mp4"));
    }

    #[test]
    fn test_dry_run_only_tests_names() {
        let source = ImportSource::named("camvideo").unwrap();
        let passes = source.exif_passes(Path::new("s"), Path::new("t"), true);

        let args = passes[0].as_slice();
        assert_eq!(args[0], "-TestName<DateTimeOriginal");
        assert!(!args.iter().any(|a| a.starts_with("-FileModifyDate")));
        assert!(args.iter().any(|a| a == "mts"));
    }

    #[test]
    fn test_sdphotos_single_pass_for_images_and_video() {
        let source = ImportSource::named("sdphotos").unwrap();
        let passes = source.exif_passes(Path::new("s"), Path::new("t"), false);
        assert_eq!(passes.len(), 1);
        let args = passes[0].as_slice();
        assert!(args.iter().any(|a| a == "cr3"));
        assert!(args.iter().any(|a| a == "mp4"));
    }
}
