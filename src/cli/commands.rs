//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::progress::{
    print_error, print_header, print_info, print_step, print_success, print_warning,
    IndicatifRenderer,
};
use crate::cli::{Args, Commands, ImportCommands};
use crate::core::config::Config;
use crate::core::exiftool::{ExifArgs, ExifTool};
use crate::core::local::{
    clean_names_args, fix_dates_args, photos_pass, LocalImport, MetadataCleanup,
};
use crate::core::plan::format_size;
use crate::core::presets::ImportSource;
use crate::core::session::{
    import_from_devices, list_devices, scan_devices, DeviceSelection, ImportOutcome,
    ImportRequest,
};
use crate::core::staging::remove_staging_dir;
use crate::core::tree::TreeWalker;
use crate::device::{DeviceLibrary, PlatformLibrary};
use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Run the appropriate command based on CLI arguments
pub fn run_command(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Commands::Import { dry, source } => {
            let dry_run = *dry || config.import.dry_run;
            match source {
                ImportCommands::Device {
                    filter,
                    source,
                    target,
                } => import_device_dir(
                    &mut PlatformLibrary::new(),
                    config,
                    filter,
                    source,
                    target,
                    dry_run,
                ),
                ImportCommands::Gopro(t)
                | ImportCommands::Camvideo(t)
                | ImportCommands::Sdphotos(t) => {
                    let name = source
                        .preset_name()
                        .ok_or_else(|| anyhow!("not a preset import"))?;
                    import_preset(
                        &mut PlatformLibrary::new(),
                        config,
                        name,
                        t.target.clone(),
                        dry_run,
                    )
                }
                ImportCommands::Local {
                    source_dir,
                    target,
                    source_sub_dir,
                    date_format,
                    rename,
                } => {
                    let layout = LocalImport {
                        date_format: date_format.clone(),
                        source_sub_dir: *source_sub_dir,
                        rename: *rename,
                    };
                    import_local(config, source_dir, target.clone(), &layout, dry_run)
                }
                ImportCommands::Video { source_dir, target } => import_local(
                    config,
                    source_dir,
                    target.clone(),
                    &LocalImport::video(),
                    dry_run,
                ),
                ImportCommands::Photos { source_dir, target } => {
                    import_photos(config, source_dir, target.clone(), dry_run)
                }
            }
        }
        Commands::ListDevices => list_devices_command(&mut PlatformLibrary::new()),
        Commands::Scan { source, filter } => {
            scan_command(&mut PlatformLibrary::new(), config, source, filter)
        }
        Commands::CleanMetadata {
            path,
            location,
            keep_vendor,
            camera,
            recursive,
            dry,
        } => {
            let cleanup = MetadataCleanup {
                location: *location,
                vendor: !*keep_vendor,
                camera: *camera,
            };
            clean_metadata(config, path, cleanup, *recursive, *dry)
        }
        Commands::CleanNames {
            path,
            recursive,
            dry,
        } => clean_names(config, path, *recursive, *dry),
        Commands::FixDates {
            path,
            recursive,
            dry,
        } => fix_dates(config, path, *recursive, *dry),
        Commands::ShowConfig => {
            show_config(config);
            Ok(())
        }
        Commands::GenerateConfig { output } => generate_config_file(output.clone()),
    }
}

/// Target directory from the command line, else from the config
fn resolve_target(target: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    target
        .or_else(|| config.import.default_target_dir.clone())
        .ok_or_else(|| {
            anyhow!("no target directory given and import.default_target_dir is not configured")
        })
}

/// Import a preset source: drain devices, rename by capture date, drop staging
pub fn import_preset<L: DeviceLibrary>(
    library: &mut L,
    config: &Config,
    name: &str,
    target: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let source =
        ImportSource::named(name).ok_or_else(|| anyhow!("unknown import source '{}'", name))?;
    let target_dir = resolve_target(target, config)?;

    print_header(&format!("Import: {}", source.description));
    print_info(&format!("Device folder: {}", source.device_dir));
    print_info(&format!("Target: {}", target_dir.display()));
    if dry_run {
        print_warning("Dry run: originals stay on the device, files are not renamed");
    }

    let request = ImportRequest {
        selection: source.selection(),
        device_dir: source.device_dir.to_string(),
        target_dir: target_dir.clone(),
        dry_run,
    };
    let walker = TreeWalker::from_config(&config.device);
    let mut progress = IndicatifRenderer::new();

    print_step(1, 3, "Copying from device");
    let outcome = import_from_devices(library, &request, &walker, &mut progress)
        .with_context(|| format!("Import of '{}' failed", source.name))?;
    print_outcome(&outcome);

    print_step(2, 3, "Renaming by capture date");
    let tool = ExifTool::from_config(&config.exiftool);
    for args in source.exif_passes(&outcome.staging_dir, &target_dir, dry_run) {
        if let Err(e) = tool.run(&args) {
            warn!("{}", e);
            print_error(&format!(
                "Renaming failed, staged files are kept in '{}'",
                outcome.staging_root.display()
            ));
            return Err(e.into());
        }
    }

    print_step(3, 3, "Cleaning up staging directory");
    if config.import.keep_staging {
        print_info(&format!(
            "Staging directory kept: {}",
            outcome.staging_root.display()
        ));
    } else {
        cleanup_staging(&outcome.staging_root, dry_run);
    }

    print_success("Import complete");
    Ok(())
}

fn cleanup_staging(staging_root: &Path, dry_run: bool) {
    // Dry-run copies are disposable; real leftovers are files exiftool did not rename
    match remove_staging_dir(staging_root, dry_run) {
        Ok(true) => print_success("Staging directory removed"),
        Ok(false) => print_warning(&format!(
            "Some files were not moved, check '{}'",
            staging_root.display()
        )),
        Err(e) => warn!(
            "Unable to remove staging directory '{}': {}",
            staging_root.display(),
            e
        ),
    }
}

/// Copy a device folder into a staging directory without renaming
pub fn import_device_dir<L: DeviceLibrary>(
    library: &mut L,
    config: &Config,
    filter: &str,
    device_dir: &str,
    target: &Path,
    dry_run: bool,
) -> Result<()> {
    let request = ImportRequest {
        selection: DeviceSelection::from_filter_arg(filter),
        device_dir: device_dir.to_string(),
        target_dir: target.to_path_buf(),
        dry_run,
    };
    info!("Importing '{}' from {}", device_dir, request.selection);

    let walker = TreeWalker::from_config(&config.device);
    let mut progress = IndicatifRenderer::new();
    let outcome = import_from_devices(library, &request, &walker, &mut progress)?;

    print_outcome(&outcome);
    print_success(&format!("Files staged in {}", outcome.staging_dir.display()));
    Ok(())
}

fn print_outcome(outcome: &ImportOutcome) {
    if outcome.devices.is_empty() {
        print_warning("No device was imported");
        return;
    }

    for report in &outcome.devices {
        print_info(&format!(
            "{}: {} of {} file(s) copied ({}), {} error(s)",
            report.label,
            report.transfer.files_copied,
            report.files_planned,
            format_size(report.transfer.bytes_copied),
            report.transfer.errors
        ));
        match &report.cleanup {
            Some(cleanup) => print_info(&format!("    {}", cleanup)),
            None => print_info("    Source files kept"),
        }
    }
}

/// List attached devices
pub fn list_devices_command<L: DeviceLibrary>(library: &mut L) -> Result<()> {
    info!("Scanning for connected devices...");
    let devices = list_devices(library)?;

    if devices.is_empty() {
        info!("No portable devices found.");
        info!("");
        info!("Make sure the device is:");
        info!("  1. Connected via USB cable");
        info!("  2. Switched on and in MTP/USB transfer mode");
        return Ok(());
    }

    info!("Found {} device(s):", devices.len());
    for device in &devices {
        println!("  {}", device.label);
    }
    Ok(())
}

/// Walk and plan without copying
pub fn scan_command<L: DeviceLibrary>(
    library: &mut L,
    config: &Config,
    device_dir: &str,
    filter: &str,
) -> Result<()> {
    let selection = DeviceSelection::from_filter_arg(filter);
    let walker = TreeWalker::from_config(&config.device);

    info!("Scanning '{}' on {}", device_dir, selection);
    let reports = scan_devices(library, &selection, device_dir, &walker)?;

    if reports.is_empty() {
        print_warning("No matching device");
        return Ok(());
    }
    for report in &reports {
        print_info(&format!(
            "{}: {} file(s), {}",
            report.label,
            report.files,
            format_size(report.total_size)
        ));
    }
    Ok(())
}

/// Run exiftool, or only print the command line on a dry run
fn run_exiftool(tool: &ExifTool, args: &ExifArgs, dry_run: bool) -> Result<()> {
    if dry_run {
        print_info(&format!(
            "Dry run, not executed: {} {}",
            tool.command().display(),
            tool.command_line(args).join(" ")
        ));
        return Ok(());
    }
    tool.run(args)?;
    Ok(())
}

/// Target of a local import: the argument, else the parent of the source folder
fn local_target(source_dir: &Path, target: Option<PathBuf>) -> PathBuf {
    target.unwrap_or_else(|| source_dir.join(".."))
}

/// Sort images and mp4 video from a local folder into dated folders
pub fn import_local(
    config: &Config,
    source_dir: &Path,
    target: Option<PathBuf>,
    layout: &LocalImport,
    dry_run: bool,
) -> Result<()> {
    let target_dir = local_target(source_dir, target);

    print_header("Import: local folder");
    print_info(&format!("Source: {}", source_dir.display()));
    print_info(&format!("Target: {}", target_dir.display()));
    print_info(&format!("Folder format: {}", layout.folder()));
    print_info(&format!("Renaming: {}", layout.rename));
    if dry_run {
        print_warning("Dry run: files are not moved, new names are only printed");
    }

    let tool = ExifTool::from_config(&config.exiftool);
    for args in layout.passes(source_dir, &target_dir, dry_run) {
        tool.run(&args)
            .with_context(|| format!("Import from '{}' failed", source_dir.display()))?;
    }

    print_success("Import complete");
    Ok(())
}

/// Move the photos directly inside a local folder into dated folders
pub fn import_photos(
    config: &Config,
    source_dir: &Path,
    target: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let target_dir = local_target(source_dir, target);
    info!(
        "Importing photos from '{}' to '{}'",
        source_dir.display(),
        target_dir.display()
    );

    let tool = ExifTool::from_config(&config.exiftool);
    tool.run(&photos_pass(source_dir, &target_dir, dry_run))
        .with_context(|| format!("Import from '{}' failed", source_dir.display()))?;

    print_success("Import complete");
    Ok(())
}

/// Restore file, EXIF and QuickTime dates from file names
pub fn fix_dates(config: &Config, path: &Path, recursive: bool, dry_run: bool) -> Result<()> {
    info!("Files to process: '{}'", path.display());
    info!("Recursively: {}", recursive);

    let tool = ExifTool::from_config(&config.exiftool);
    run_exiftool(&tool, &fix_dates_args(path, recursive), dry_run)?;
    if !dry_run {
        print_success("Dates fixed");
    }
    Ok(())
}

/// Drop " - Copy" suffixes from file names
///
/// A dry run still calls exiftool, which then only prints the new names.
pub fn clean_names(config: &Config, path: &Path, recursive: bool, dry_run: bool) -> Result<()> {
    info!("Files to process: '{}'", path.display());
    info!("Recursively: {}", recursive);
    info!("Dry run: {}", dry_run);

    let tool = ExifTool::from_config(&config.exiftool);
    tool.run(&clean_names_args(path, recursive, dry_run))?;
    print_success("Names cleaned");
    Ok(())
}

/// Strip the selected tag groups from local files in place
pub fn clean_metadata(
    config: &Config,
    path: &Path,
    cleanup: MetadataCleanup,
    recursive: bool,
    dry_run: bool,
) -> Result<()> {
    info!("Files to process: '{}'", path.display());
    info!("Recursively: {}", recursive);
    info!("Including location: {}", cleanup.location);
    info!("Including vendor: {}", cleanup.vendor);
    info!("Including camera: {}", cleanup.camera);
    info!("Dry run: {}", dry_run);

    let Some(args) = cleanup.exif_args(path, recursive) else {
        print_warning("Nothing to clean");
        return Ok(());
    };

    let tool = ExifTool::from_config(&config.exiftool);
    run_exiftool(&tool, &args, dry_run)?;
    if !dry_run {
        print_success("Metadata cleaned");
    }
    Ok(())
}

/// Generate a configuration file at the specified or default location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let path = Config::write_default_config(output)?;

    info!("Configuration file: {}", path.display());
    info!("Edit this file to customize device, import and exiftool settings.");
    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("Current Configuration:");
    info!("----------------------");
    info!("[device]");
    info!("  ignored_names = {:?}", config.device.ignored_names);
    info!("  sort_entries = {}", config.device.sort_entries);
    info!("");
    info!("[import]");
    info!(
        "  default_target_dir = {}",
        config
            .import
            .default_target_dir
            .as_ref()
            .map(|p| format!("\"{}\"", p.display()))
            .unwrap_or_else(|| "(none)".to_string())
    );
    info!("  keep_staging = {}", config.import.keep_staging);
    info!("  dry_run = {}", config.import.dry_run);
    info!("");
    info!("[exiftool]");
    info!(
        "  path = {}",
        config
            .exiftool
            .path
            .as_ref()
            .map(|p| format!("\"{}\"", p.display()))
            .unwrap_or_else(|| "(auto)".to_string())
    );
    info!("  default_args = {:?}", config.exiftool.default_args);
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
}
