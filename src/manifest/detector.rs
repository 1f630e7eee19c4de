//! Terraform file discovery
//!
//! Features:
//! - Recursive walk collecting `*.tf` files
//! - Skips hidden directories and the `.terraform` plugin cache
//! - Deterministic (sorted) output

use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of Terraform configuration files
pub const TERRAFORM_EXTENSION: &str = "tf";

/// Returns true for directories that are never descended into
fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Returns true if `path` names a Terraform configuration file
pub fn is_terraform_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(TERRAFORM_EXTENSION)
}

/// Find all Terraform files below `root`
///
/// `root` may also be a single file, which is returned as-is.
pub fn find_terraform_files(root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Err(ConfigError::InvalidPath {
            path: root.to_path_buf(),
            message: "path does not exist".to_string(),
        });
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory, skipping");
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if !is_skipped_dir(&path) {
                    pending.push(path);
                }
            } else if is_terraform_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    tracing::debug!(count = files.len(), root = %root.display(), "discovered terraform files");
    Ok(files)
}
