//! Configuration module for the media tool
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\media-tool\config.toml
//! - Linux: ~/.config/media-tool/config.toml
//! - macOS: ~/Library/Application Support/media-tool/config.toml

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for config directory
const APP_NAME: &str = "media-tool";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Local override looked up in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "media-tool.toml";

/// Entries that are never listed from a device, matched by exact name
pub const DEFAULT_IGNORED_NAMES: &[&str] = &["System Volume Information", "$RECYCLE.BIN"];

/// Get the standard configuration directory for the application.
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device traversal settings
    pub device: DeviceConfig,

    /// Import settings
    pub import: ImportConfig,

    /// External metadata tool settings
    pub exiftool: ExifToolConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Device traversal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Names skipped anywhere in a device tree (exact, case-sensitive match)
    pub ignored_names: BTreeSet<String>,

    /// Sort children by name instead of keeping the order reported by the device
    pub sort_entries: bool,
}

/// Import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Target directory used when none is given on the command line
    pub default_target_dir: Option<PathBuf>,

    /// Keep the staging directory after the metadata tool has moved the files
    pub keep_staging: bool,

    /// Never delete originals from the device
    pub dry_run: bool,
}

/// External metadata tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifToolConfig {
    /// Explicit path to the exiftool binary (auto-detected when empty)
    pub path: Option<PathBuf>,

    /// Arguments passed before every invocation
    pub default_args: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ignored_names: DEFAULT_IGNORED_NAMES.iter().map(|s| s.to_string()).collect(),
            sort_entries: false,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_target_dir: None,
            keep_staging: false,
            dry_run: false,
        }
    }
}

impl Default for ExifToolConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_args: vec!["-v0".to_string(), "-progress".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./media-tool.log"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::ParseError(_, msg) => ConfigError::ParseError(path.to_path_buf(), msg),
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(PathBuf::new(), e.to_string()))
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./media-tool.toml (current directory)
    /// 2. Standard config location
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Get the path where the config file is (or would be) located.
    pub fn get_active_config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
        if local.exists() {
            return local;
        }

        get_config_path().unwrap_or(local)
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }

    /// Write the commented default config to `path`, or the standard location
    pub fn write_default_config(path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        let path = match path {
            Some(path) => path,
            None => get_config_path().ok_or(ConfigError::ConfigDirNotFound)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteError(parent.to_path_buf(), e.to_string()))?;
            }
        }

        fs::write(&path, Self::generate_default_config())
            .map_err(|e| ConfigError::WriteError(path.clone(), e.to_string()))?;

        Ok(path)
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
    /// Could not determine config directory
    ConfigDirNotFound,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ParseError(path, err) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::WriteError(path, err) => {
                write!(
                    f,
                    "Failed to write config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ConfigDirNotFound => {
                write!(f, "Could not determine configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config
            .device
            .ignored_names
            .contains("System Volume Information"));
        assert!(config.device.ignored_names.contains("$RECYCLE.BIN"));
        assert!(!config.device.sort_entries);
        assert!(!config.import.dry_run);
        assert_eq!(config.exiftool.default_args, vec!["-v0", "-progress"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [device]
            sort_entries = true

            [import]
            default_target_dir = "/media/photos"
            "#,
        )
        .unwrap();

        assert!(config.device.sort_entries);
        assert_eq!(config.device.ignored_names.len(), 2);
        assert_eq!(
            config.import.default_target_dir,
            Some(PathBuf::from("/media/photos"))
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(&Config::generate_default_config()).unwrap();
        assert_eq!(config.device.ignored_names.len(), 2);
        assert!(!config.import.keep_staging);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse("[device\nsort_entries = true").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_, _)));
    }

    #[test]
    fn test_write_default_config_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let written = Config::write_default_config(Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let loaded = Config::load(&path).unwrap();
        assert!(loaded.device.ignored_names.contains("$RECYCLE.BIN"));
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
