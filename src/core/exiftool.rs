//! ExifTool hand-off
//!
//! Thin wrapper that collects command-line arguments and runs the external
//! `exiftool` binary. Nothing is parsed from its output.

use crate::core::config::ExifToolConfig;
use crate::core::error::{MediaToolError, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Binary looked up on PATH when no bundled copy is found
const DEFAULT_COMMAND: &str = "exiftool";

/// Still image extensions handled by the import passes
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "nef", "cr2", "cr3"];

/// Tags written by editing software and camera firmware updaters
const VENDOR_TAGS: &[&str] = &[
    "Software",
    "WriterName",
    "ReaderName",
    "CreatorTool",
    "HistorySoftwareAgent",
    "ProcessingSoftware",
    "XMPToolkit",
    "OriginatingProgram",
    "Producer",
    "Encoder",
];

/// Camera identity tags and the maker-note groups of common vendors
const CAMERA_TAGS: &[&str] = &[
    "Make",
    "Model",
    "SerialNumber",
    "InternalSerialNumber",
    "BodySerialNumber",
    "CameraSerialNumber",
    "OwnerName",
    "CameraOwnerName",
    "LensMake",
    "LensModel",
    "LensInfo",
    "LensSerialNumber",
    "MakerNotes:all",
    "Canon:all",
    "Nikon:all",
    "Sony:all",
    "Olympus:all",
    "Panasonic:all",
    "Pentax:all",
    "FujiFilm:all",
    "Samsung:all",
    "Sigma:all",
    "Leica:all",
    "Ricoh:all",
    "Casio:all",
    "Minolta:all",
    "Kodak:all",
    "GoPro:all",
    "Apple:all",
    "DJI:all",
    "Google:all",
];

/// Resolved exiftool command plus the arguments prepended to every run
#[derive(Debug, Clone)]
pub struct ExifTool {
    command: PathBuf,
    default_args: Vec<String>,
}

impl ExifTool {
    pub fn new(command: PathBuf, default_args: Vec<String>) -> Self {
        Self {
            command,
            default_args,
        }
    }

    /// Configured path, else `exiftool/exiftool(.exe)` next to the executable, else PATH
    pub fn from_config(config: &ExifToolConfig) -> Self {
        let command = match &config.path {
            Some(path) => path.clone(),
            None => Self::bundled_command().unwrap_or_else(|| PathBuf::from(DEFAULT_COMMAND)),
        };
        Self::new(command, config.default_args.clone())
    }

    fn bundled_command() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        let dir = exe.parent()?;
        let name = if cfg!(windows) {
            "exiftool.exe"
        } else {
            "exiftool"
        };
        let candidate = dir.join("exiftool").join(name);
        if candidate.is_file() {
            Some(candidate)
        } else {
            debug!(
                "No bundled exiftool at '{}', using '{}' from PATH",
                candidate.display(),
                DEFAULT_COMMAND
            );
            None
        }
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    /// Full argument vector: default arguments followed by `args`
    pub fn command_line(&self, args: &ExifArgs) -> Vec<String> {
        self.default_args
            .iter()
            .chain(args.as_slice())
            .cloned()
            .collect()
    }

    /// Run exiftool, inheriting stdout and stderr
    pub fn run(&self, args: &ExifArgs) -> Result<()> {
        let argv = self.command_line(args);
        debug!(
            "ExifTool command: '{} {}'",
            self.command.display(),
            argv.join(" ")
        );

        let status = Command::new(&self.command)
            .args(&argv)
            .status()
            .map_err(|e| {
                MediaToolError::ExifTool(format!(
                    "unable to start '{}': {}",
                    self.command.display(),
                    e
                ))
            })?;

        if status.success() {
            info!("ExifTool finished");
            Ok(())
        } else {
            Err(MediaToolError::ExifTool(format!(
                "'{}' exited with {}",
                self.command.display(),
                status
            )))
        }
    }
}

/// Arguments for one exiftool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifArgs {
    args: Vec<String>,
}

impl ExifArgs {
    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Append raw arguments
    pub fn add<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `-r`
    pub fn recursively(&mut self) -> &mut Self {
        self.add(["-r"])
    }

    /// File, directory or wildcard to process
    pub fn source<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        let path = path.as_ref().display().to_string();
        self.add([path])
    }

    pub fn for_extension(&mut self, ext: &str) -> &mut Self {
        self.add(["-ext", ext])
    }

    pub fn for_images(&mut self) -> &mut Self {
        for ext in IMAGE_EXTENSIONS {
            self.for_extension(ext);
        }
        self
    }

    pub fn for_video_mp4(&mut self) -> &mut Self {
        self.for_extension("mp4")
    }

    pub fn for_video_avchd(&mut self) -> &mut Self {
        self.for_extension("mts")
    }

    /// `-d FORMAT`, also used as the rename target pattern
    pub fn date_format(&mut self, format: &str) -> &mut Self {
        self.add(["-d", format])
    }

    /// `-TAG<FROM`
    pub fn change_tag(&mut self, tag: &str, from: &str) -> &mut Self {
        self.add([format!("-{}<{}", tag, from)])
    }

    /// Set file system modification and creation dates from `from`
    pub fn change_file_date(&mut self, from: &str) -> &mut Self {
        self.change_tag("FileModifyDate", from)
            .change_tag("FileCreateDate", from)
    }

    pub fn change_exif_date(&mut self, from: &str) -> &mut Self {
        self.change_tag("CreateDate", from)
            .change_tag("DateTimeOriginal", from)
    }

    /// QuickTime container and track dates
    pub fn change_mp4_date(&mut self, from: &str) -> &mut Self {
        for tag in [
            "CreateDate",
            "ModifyDate",
            "TrackCreateDate",
            "TrackModifyDate",
            "MediaCreateDate",
            "MediaModifyDate",
        ] {
            self.change_tag(tag, from);
        }
        self
    }

    /// `-TAG=` (delete the tag)
    pub fn clean_tag(&mut self, tag: &str) -> &mut Self {
        self.add([format!("-{}=", tag)])
    }

    pub fn clean_vendor_tags(&mut self) -> &mut Self {
        for tag in VENDOR_TAGS {
            self.clean_tag(tag);
        }
        self
    }

    pub fn clean_location_tags(&mut self) -> &mut Self {
        self.clean_tag("gps:all")
    }

    pub fn clean_camera_tags(&mut self) -> &mut Self {
        for tag in CAMERA_TAGS {
            self.clean_tag(tag);
        }
        self
    }

    /// Move files to `target_pattern` (a `-d` pattern) by the date in `date_tag`
    ///
    /// A dry run only prints the new names and leaves file dates alone.
    pub fn rename_by_date(
        &mut self,
        date_tag: &str,
        target_pattern: &str,
        dry_run: bool,
    ) -> &mut Self {
        let rename_tag = if dry_run { "TestName" } else { "FileName" };
        if !dry_run {
            self.change_file_date(date_tag);
        }
        self.change_tag(rename_tag, date_tag).date_format(target_pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> ExifTool {
        ExifTool::from_config(&ExifToolConfig::default())
    }

    #[test]
    fn test_default_args_are_prepended() {
        let tool = tool();
        let mut args = ExifArgs::default();
        args.add(["arg1", "arg2"]);

        assert_eq!(
            tool.command_line(&args),
            vec!["-v0", "-progress", "arg1", "arg2"]
        );
    }

    #[test]
    fn test_configured_path_wins() {
        let config = ExifToolConfig {
            path: Some(PathBuf::from("/opt/exiftool/exiftool")),
            default_args: Vec::new(),
        };
        let tool = ExifTool::from_config(&config);
        assert_eq!(tool.command(), Path::new("/opt/exiftool/exiftool"));
        assert!(tool.command_line(&ExifArgs::default()).is_empty());
    }

    #[test]
    fn test_extension_filters() {
        let mut args = ExifArgs::default();
        args.for_images();
        assert_eq!(
            args.as_slice(),
            &["-ext", "jpg", "-ext", "nef", "-ext", "cr2", "-ext", "cr3"]
        );

        let mut args = ExifArgs::default();
        args.for_video_mp4().for_video_avchd();
        assert_eq!(args.as_slice(), &["-ext", "mp4", "-ext", "mts"]);
    }

    #[test]
    fn test_date_changes() {
        let mut args = ExifArgs::default();
        args.change_file_date("CreateDate");
        assert_eq!(
            args.as_slice(),
            &["-FileModifyDate<CreateDate", "-FileCreateDate<CreateDate"]
        );

        let mut args = ExifArgs::default();
        args.change_exif_date("FileModifyDate");
        assert_eq!(
            args.as_slice(),
            &["-CreateDate<FileModifyDate", "-DateTimeOriginal<FileModifyDate"]
        );

        let mut args = ExifArgs::default();
        args.change_mp4_date("2023:01:01 12:00:00");
        assert_eq!(args.len(), 6);
        assert_eq!(args.as_slice()[2], "-TrackCreateDate<2023:01:01 12:00:00");
    }

    #[test]
    fn test_clean_tags() {
        let mut args = ExifArgs::default();
        args.clean_location_tags();
        assert_eq!(args.as_slice(), &["-gps:all="]);

        let mut args = ExifArgs::default();
        args.clean_vendor_tags();
        assert_eq!(args.len(), 10);
        for tag in ["-Software=", "-WriterName=", "-ReaderName="] {
            assert!(args.as_slice().iter().any(|a| a == tag), "{}", tag);
        }
    }

    #[test]
    fn test_clean_camera_tags() {
        let mut args = ExifArgs::default();
        args.clean_camera_tags();
        assert!(args.len() > 30);
        for tag in ["-Canon:all=", "-Sony:all=", "-Nikon:all=", "-SerialNumber="] {
            assert!(args.as_slice().iter().any(|a| a == tag), "{}", tag);
        }
    }

    #[test]
    fn test_rename_by_date() {
        let mut args = ExifArgs::default();
        args.rename_by_date("CreateDate", "/out/%Y.%m.%d/%%f%%-c.%%e", false);
        assert_eq!(
            args.as_slice(),
            &[
                "-FileModifyDate<CreateDate",
                "-FileCreateDate<CreateDate",
                "-FileName<CreateDate",
                "-d",
                "/out/%Y.%m.%d/%%f%%-c.%%e",
            ]
        );

        let mut args = ExifArgs::default();
        args.rename_by_date("CreateDate", "/out/%Y", true);
        assert_eq!(args.as_slice(), &["-TestName<CreateDate", "-d", "/out/%Y"]);
    }

    #[test]
    fn test_complex_chain() {
        let mut args = ExifArgs::default();
        args.recursively()
            .source("/path/to/files")
            .for_images()
            .change_tag("DateTime", "2023:01:01 12:00:00")
            .clean_vendor_tags();

        assert_eq!(args.len(), 1 + 1 + 8 + 1 + 10);
        assert_eq!(args.as_slice()[0], "-r");
        assert_eq!(args.as_slice()[1], "/path/to/files");
        assert_eq!(args.as_slice()[2], "-ext");
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let tool = ExifTool::new(
            PathBuf::from("/definitely/not/exiftool-binary"),
            Vec::new(),
        );
        let err = tool.run(&ExifArgs::default()).unwrap_err();
        assert!(matches!(err, MediaToolError::ExifTool(_)));
    }
}
