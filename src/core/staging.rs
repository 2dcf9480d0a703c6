//! Staging directory removal

use crate::core::error::Result;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Whether `dir` holds no regular file at any depth
///
/// Unreadable entries count as content.
pub fn is_tree_empty(dir: &Path) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("'{}' unable to open: {}", dir.display(), e);
            return false;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else {
            return false;
        };
        match entry.file_type() {
            Ok(t) if t.is_dir() => {
                if !is_tree_empty(&entry.path()) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

/// Remove a staging directory when forced or when nothing is left in it
///
/// Returns whether the directory was removed.
pub fn remove_staging_dir(dir: &Path, remove_non_empty: bool) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }

    if remove_non_empty || is_tree_empty(dir) {
        fs::remove_dir_all(dir)?;
        info!("Removed staging directory '{}'", dir.display());
        Ok(true)
    } else {
        debug!("Keeping non-empty staging directory '{}'", dir.display());
        Ok(false)
    }
}
