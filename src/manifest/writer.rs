//! Terraform file writing and update operations
//!
//! This module provides:
//! - ManifestWriter for applying resolved versions to `.tf` files
//! - Dry-run mode support (no actual file modifications)
//! - Atomic replacement through a temporary sibling file

use crate::domain::FileUpdateResult;
use crate::error::ManifestError;
use crate::manifest::{rewrite, PendingUpdate};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Writer for Terraform files that applies version updates
pub struct ManifestWriter {
    /// Whether to run in dry-run mode (no file modifications)
    dry_run: bool,
}

/// Result of applying updates to a Terraform file
#[derive(Debug)]
pub struct WriteResult {
    /// Path to the file
    pub path: PathBuf,
    /// Number of declarations rewritten
    pub updates_applied: usize,
    /// Whether the rewrite changed the content (true in dry-run too)
    pub content_changed: bool,
    /// Whether the file was actually modified on disk
    pub file_modified: bool,
    /// Errors encountered during update
    pub errors: Vec<String>,
}

impl WriteResult {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            updates_applied: 0,
            content_changed: false,
            file_modified: false,
            errors: Vec::new(),
        }
    }

    /// Returns true if any updates were applied
    pub fn has_updates(&self) -> bool {
        self.updates_applied > 0
    }

    /// Returns true if any errors occurred
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl ManifestWriter {
    /// Create a new ManifestWriter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Create a ManifestWriter in dry-run mode
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// Check if this writer is in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Apply the `Update` results of one file
    ///
    /// The file is rewritten in memory first; nothing touches disk unless the
    /// whole rewrite succeeds.
    pub fn apply_updates(&self, file: &FileUpdateResult) -> Result<WriteResult, ManifestError> {
        let path = &file.path;
        let mut result = WriteResult::new(path);

        let pending: HashMap<_, _> = file
            .results
            .iter()
            .filter_map(PendingUpdate::from_result)
            .collect();
        if pending.is_empty() {
            return Ok(result);
        }

        let content = read_manifest(path)?;
        let updated = rewrite(&content, &pending).map_err(|e| e.with_path(path))?;
        result.updates_applied = pending.len();

        if updated == content {
            return Ok(result);
        }
        result.content_changed = true;

        if self.dry_run {
            tracing::info!(path = %path.display(), "dry run, not writing");
        } else {
            write_manifest(path, &updated)?;
            result.file_modified = true;
        }

        Ok(result)
    }
}

/// Read a Terraform file
pub fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))
}

/// Temporary sibling used for atomic replacement, e.g. `main.tf.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `content` to `path` by writing a temporary file and renaming it over the target
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, content) {
        let _ = fs::remove_file(&tmp);
        return Err(ManifestError::write_error(path, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ManifestError::write_error(path, e));
    }
    Ok(())
}
