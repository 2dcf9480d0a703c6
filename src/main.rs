//! Media Tool - CLI Entry Point
//!
//! Thin wrapper around the library: argument parsing, logging setup and
//! command dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};
use media_tool::cli::{self, Args, DualWriter};
use media_tool::core::config::Config;
use std::fs::OpenOptions;
use std::io::Write;

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let log_level = parse_level(&config.logging.level);

    if config.logging.log_to_file {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.log_file)
            .with_context(|| {
                format!(
                    "Failed to open log file '{}'",
                    config.logging.log_file.display()
                )
            })?;

        Builder::new()
            .filter_level(log_level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {} {}] {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .target(env_logger::Target::Pipe(Box::new(DualWriter {
                console: std::io::stderr(),
                file: Some(log_file),
            })))
            .init();

        info!("Logging to file: {}", config.logging.log_file.display());
    } else {
        Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level))
            .target(env_logger::Target::Pipe(Box::new(DualWriter {
                console: std::io::stderr(),
                file: None,
            })))
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = if let Some(ref config_path) = args.config {
        match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        }
    } else {
        Config::load_default().unwrap_or_default()
    };

    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config)?;

    info!("{} v{}", media_tool::NAME, media_tool::VERSION);
    info!("============================");

    cli::run_command(&args, &config)
}
