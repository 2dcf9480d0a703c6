//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use crate::core::local::DEFAULT_DATE_FORMAT;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Import photos and videos from MTP devices (GoPro, camcorders, SD cards)
#[derive(Parser, Debug)]
#[command(name = "media-tool")]
#[command(author = "Maksym Medvedev")]
#[command(version)]
#[command(about = "Import photos and videos from MTP devices, rename them by capture date and clean their metadata", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import media from attached devices
    ///
    /// Files are copied into a timestamped staging directory, removed from the
    /// device, then renamed by capture date into the target directory.
    Import {
        /// Copy only; keep originals on the device and only print new names
        #[arg(short, long, global = true)]
        dry: bool,

        #[command(subcommand)]
        source: ImportCommands,
    },

    /// List attached MTP devices
    ListDevices,

    /// Walk a device folder and report what an import would copy
    Scan {
        /// Device folder to walk, e.g. DCIM/100GOPRO
        #[arg(short, long, default_value = "DCIM")]
        source: String,

        /// Device label substring, or "all"
        #[arg(short, long, default_value = "all")]
        filter: String,
    },

    /// Remove vendor (and optionally location and camera) metadata from local files
    ///
    /// PATH may be a directory or a wildcard file name.
    CleanMetadata {
        /// Files to process
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also remove GPS tags
        #[arg(short, long)]
        location: bool,

        /// Leave software and vendor tags alone
        #[arg(long)]
        keep_vendor: bool,

        /// Also remove camera model, serial numbers and maker notes
        #[arg(short = 'p', long)]
        camera: bool,

        /// Process sub-directories
        #[arg(short, long)]
        recursive: bool,

        /// Print the exiftool command instead of running it
        #[arg(short, long)]
        dry: bool,
    },

    /// Strip " - Copy" and " Copy" suffixes from file names
    ///
    /// PATH may be a directory or a wildcard file name.
    CleanNames {
        /// Files to process
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Process sub-directories
        #[arg(short, long)]
        recursive: bool,

        /// Only print the new names
        #[arg(short, long)]
        dry: bool,
    },

    /// Set file, EXIF and QuickTime dates from the date in the file name
    ///
    /// PATH may be a directory or a wildcard file name.
    FixDates {
        /// Files to process
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Process sub-directories
        #[arg(short, long)]
        recursive: bool,

        /// Print the exiftool command instead of running it
        #[arg(short, long)]
        dry: bool,
    },

    /// Show current configuration
    ShowConfig,

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Target directory argument shared by the preset imports
#[derive(ClapArgs, Debug, Clone)]
pub struct TargetArg {
    /// Directory the dated folders are created in (defaults to import.default_target_dir)
    pub target: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// GoPro photos and clips (DCIM/100GOPRO)
    Gopro(TargetArg),

    /// Camcorder AVCHD video (PRIVATE/AVCHD/BDMV/STREAM)
    Camvideo(TargetArg),

    /// Photos and video from every attached SD card (DCIM)
    Sdphotos(TargetArg),

    /// Copy a device folder as-is, without renaming
    Device {
        /// Device label substring, or "all"
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Device folder to copy
        #[arg(short, long, default_value = "DCIM")]
        source: String,

        /// Directory the staging folder is created in
        target: PathBuf,
    },

    /// Images and mp4 video from a local folder, sorted into dated folders
    ///
    /// Using the same folder as source and target with -f and -r fixes names and dates in place.
    Local {
        /// Folder to import from (searched recursively)
        source_dir: PathBuf,

        /// Directory the dated folders are created in (defaults to the parent of SOURCE_DIR)
        target: Option<PathBuf>,

        /// Put files into '<date>/src' instead of '<date>'
        #[arg(short = 's', long)]
        source_sub_dir: bool,

        /// Dated folder format, exiftool -d syntax
        #[arg(short = 'f', long, default_value = DEFAULT_DATE_FORMAT)]
        date_format: String,

        /// Rename to IMG_/VID_ plus capture time
        #[arg(short, long)]
        rename: bool,
    },

    /// Photos directly inside a local folder, names kept
    Photos {
        /// Folder to import from
        source_dir: PathBuf,

        /// Directory the dated folders are created in (defaults to the parent of SOURCE_DIR)
        target: Option<PathBuf>,
    },

    /// Images and mp4 video from a local folder, renamed into '<date>/src'
    Video {
        /// Folder to import from (searched recursively)
        source_dir: PathBuf,

        /// Directory the dated folders are created in (defaults to the parent of SOURCE_DIR)
        target: Option<PathBuf>,
    },
}

impl ImportCommands {
    /// Preset name for the rename-based sources
    pub fn preset_name(&self) -> Option<&'static str> {
        match self {
            ImportCommands::Gopro(_) => Some("gopro"),
            ImportCommands::Camvideo(_) => Some("camvideo"),
            ImportCommands::Sdphotos(_) => Some("sdphotos"),
            ImportCommands::Device { .. }
            | ImportCommands::Local { .. }
            | ImportCommands::Photos { .. }
            | ImportCommands::Video { .. } => None,
        }
    }
}
