//! Passes over media already on a local disk
//!
//! Importing a folder, restoring dates from file names, dropping ` - Copy`
//! suffixes and wiping metadata each reduce to one or more exiftool
//! argument lists. Nothing here touches a device.

use crate::core::exiftool::ExifArgs;
use crate::core::presets::MediaKind;
use std::path::Path;

/// Dated folder name used unless `--date-format` says otherwise
pub const DEFAULT_DATE_FORMAT: &str = "%Y.%m.%d";

const KEEP_NAME: &str = "%%f%%-c.%%e";
const IMAGE_NAME: &str = "IMG_%Y%m%d_%H%M%S%%-c.%%e";
const VIDEO_NAME: &str = "VID_%Y%m%d_%H%M%S%%-c.%%e";

/// Rewrites `Name - Copy.jpg` and `Name Copy.jpg` to `Name.jpg` (or `Name-1.jpg` on clash)
const COPY_SUFFIX_EXPR: &str = "${filename;s/ - Copy/%-c/gi;s/ Copy/%-c/gi}";

/// Target layout of a folder import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImport {
    /// Dated folder name in exiftool `-d` syntax
    pub date_format: String,
    /// Use `<date>/src` instead of `<date>`
    pub source_sub_dir: bool,
    /// Rename to `IMG_`/`VID_` plus capture time instead of keeping the name
    pub rename: bool,
}

impl Default for LocalImport {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            source_sub_dir: false,
            rename: false,
        }
    }
}

impl LocalImport {
    /// Layout of the video import: renamed files below `<date>/src`
    pub fn video() -> Self {
        Self {
            source_sub_dir: true,
            rename: true,
            ..Self::default()
        }
    }

    /// Folder pattern below the target directory
    pub fn folder(&self) -> String {
        if self.source_sub_dir {
            format!("{}/src", self.date_format)
        } else {
            self.date_format.clone()
        }
    }

    /// One recursive pass for images, one for mp4 video
    pub fn passes(&self, source_dir: &Path, target_dir: &Path, dry_run: bool) -> Vec<ExifArgs> {
        let folder = target_dir.join(self.folder());
        let (image_name, video_name) = if self.rename {
            (IMAGE_NAME, VIDEO_NAME)
        } else {
            (KEEP_NAME, KEEP_NAME)
        };

        [(MediaKind::Images, image_name), (MediaKind::Mp4, video_name)]
            .into_iter()
            .map(|(media, name)| {
                let pattern = folder.join(name).display().to_string();
                let mut args = ExifArgs::default();
                args.rename_by_date("CreateDate", &pattern, dry_run);
                media.restrict(&mut args);
                args.recursively().source(source_dir);
                args
            })
            .collect()
    }
}

/// Every file directly inside `source_dir` into `<target>/<date>/`, names kept
pub fn photos_pass(source_dir: &Path, target_dir: &Path, dry_run: bool) -> ExifArgs {
    let pattern = target_dir
        .join(DEFAULT_DATE_FORMAT)
        .join(KEEP_NAME)
        .display()
        .to_string();
    let mut args = ExifArgs::default();
    args.rename_by_date("CreateDate", &pattern, dry_run)
        .source(source_dir);
    args
}

/// Copy the date encoded in file names into file, EXIF and QuickTime dates
pub fn fix_dates_args(path: &Path, recursive: bool) -> ExifArgs {
    let mut args = ExifArgs::default();
    args.change_file_date("FileName")
        .change_exif_date("FileName")
        .change_mp4_date("FileName");
    if recursive {
        args.recursively();
    }
    args.source(path);
    args
}

/// Strip ` - Copy` / ` Copy` from file names; a dry run only prints the new names
pub fn clean_names_args(path: &Path, recursive: bool, dry_run: bool) -> ExifArgs {
    let rename_tag = if dry_run { "TestName" } else { "FileName" };
    let mut args = ExifArgs::default();
    args.change_tag(rename_tag, COPY_SUFFIX_EXPR);
    if recursive {
        args.recursively();
    }
    args.source(path);
    args
}

/// Tag groups removed by `clean-metadata`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataCleanup {
    pub location: bool,
    pub vendor: bool,
    pub camera: bool,
}

impl MetadataCleanup {
    pub fn is_empty(&self) -> bool {
        !(self.location || self.vendor || self.camera)
    }

    /// `None` when no group is selected
    pub fn exif_args(&self, path: &Path, recursive: bool) -> Option<ExifArgs> {
        if self.is_empty() {
            return None;
        }

        let mut args = ExifArgs::default();
        if self.location {
            args.clean_location_tags();
        }
        if self.vendor {
            args.clean_vendor_tags();
        }
        if self.camera {
            args.clean_camera_tags();
        }
        if recursive {
            args.recursively();
        }
        args.source(path);
        Some(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(parts: &[&str]) -> String {
        parts
            .iter()
            .fold(Path::new("/photos").to_path_buf(), |acc, p| acc.join(p))
            .display()
            .to_string()
    }

    #[test]
    fn test_local_import_keeps_names_by_default() {
        let passes =
            LocalImport::default().passes(Path::new("/card"), Path::new("/photos"), false);
        assert_eq!(passes.len(), 2);

        let images = passes[0].as_slice();
        assert_eq!(images[0], "-FileModifyDate<CreateDate");
        assert_eq!(images[2], "-FileName<CreateDate");
        assert_eq!(images[4], target(&["%Y.%m.%d", "%%f%%-c.%%e"]));
        assert!(images.iter().any(|a| a == "cr3"));
        assert_eq!(&images[images.len() - 2..], &["-r", "/card"]);

        let video = passes[1].as_slice();
        assert!(video.iter().any(|a| a == "mp4"));
        assert!(!video.iter().any(|a| a == "jpg"));
    }

    #[test]
    fn test_video_layout_renames_into_src() {
        let layout = LocalImport::video();
        assert_eq!(layout.folder(), "%Y.%m.%d/src");

        let passes = layout.passes(Path::new("/card"), Path::new("/photos"), true);
        let images = passes[0].as_slice();
        assert_eq!(images[0], "-TestName<CreateDate");
        assert_eq!(images[2], target(&["%Y.%m.%d/src", "IMG_%Y%m%d_%H%M%S%%-c.%%e"]));
        assert_eq!(
            passes[1].as_slice()[2],
            target(&["%Y.%m.%d/src", "VID_%Y%m%d_%H%M%S%%-c.%%e"])
        );
    }

    #[test]
    fn test_custom_date_format() {
        let layout = LocalImport {
            date_format: "%Y/%m".to_string(),
            source_sub_dir: false,
            rename: false,
        };
        assert_eq!(layout.folder(), "%Y/%m");
    }

    #[test]
    fn test_photos_pass_is_flat() {
        let args = photos_pass(Path::new("/card"), Path::new("/photos"), true);
        assert_eq!(
            args.as_slice(),
            &[
                "-TestName<CreateDate".to_string(),
                "-d".to_string(),
                target(&["%Y.%m.%d", "%%f%%-c.%%e"]),
                "/card".to_string(),
            ]
        );
    }

    #[test]
    fn test_fix_dates_reads_file_names() {
        let args = fix_dates_args(Path::new("/photos"), true);
        let all = args.as_slice();
        assert_eq!(all[0], "-FileModifyDate<FileName");
        assert!(all.iter().any(|a| a == "-DateTimeOriginal<FileName"));
        assert!(all.iter().any(|a| a == "-TrackCreateDate<FileName"));
        assert_eq!(&all[all.len() - 2..], &["-r", "/photos"]);

        let args = fix_dates_args(Path::new("/photos"), false);
        assert!(!args.as_slice().iter().any(|a| a == "-r"));
    }

    #[test]
    fn test_clean_names() {
        let args = clean_names_args(Path::new("."), false, false);
        assert_eq!(
            args.as_slice(),
            &["-FileName<${filename;s/ - Copy/%-c/gi;s/ Copy/%-c/gi}", "."]
        );

        let args = clean_names_args(Path::new("."), true, true);
        assert!(args.as_slice()[0].starts_with("-TestName<"));
        assert_eq!(args.as_slice()[1], "-r");
    }

    #[test]
    fn test_metadata_cleanup_groups() {
        assert!(MetadataCleanup::default()
            .exif_args(Path::new("."), false)
            .is_none());

        let cleanup = MetadataCleanup {
            location: true,
            vendor: false,
            camera: true,
        };
        let args = cleanup.exif_args(Path::new("/photos"), true).unwrap();
        let all = args.as_slice();
        assert_eq!(all[0], "-gps:all=");
        assert!(all.iter().any(|a| a == "-Canon:all="));
        assert!(!all.iter().any(|a| a == "-Software="));
        assert_eq!(&all[all.len() - 2..], &["-r", "/photos"]);
    }
}
