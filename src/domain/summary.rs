//! Update result summary types
//!
//! Provides structures for tracking update results at file and overall levels.

use super::{DeclarationKind, UpdateResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Update result for a single `.tf` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUpdateResult {
    /// Path to the file
    pub path: PathBuf,
    /// Individual declaration results
    pub results: Vec<UpdateResult>,
    /// Whether the file has pending or applied updates
    pub modified: bool,
}

impl FileUpdateResult {
    /// Creates a new FileUpdateResult
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            results: Vec::new(),
            modified: false,
        }
    }

    /// Adds an update result
    pub fn add_result(&mut self, result: UpdateResult) {
        if result.is_update() {
            self.modified = true;
        }
        self.results.push(result);
    }

    /// Returns the number of updates
    pub fn update_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_update()).count()
    }

    /// Returns the number of skips
    pub fn skip_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_skip()).count()
    }

    /// Returns all updates
    pub fn updates(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_update())
    }

    /// Returns all skips
    pub fn skips(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_skip())
    }

    /// Returns true if any declarations were updated
    pub fn has_updates(&self) -> bool {
        self.update_count() > 0
    }
}

/// Overall summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// Results for each file processed
    pub files: Vec<FileUpdateResult>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl UpdateSummary {
    /// Creates a new UpdateSummary
    pub fn new(dry_run: bool) -> Self {
        Self {
            files: Vec::new(),
            dry_run,
        }
    }

    /// Adds a file result
    pub fn add_file(&mut self, file: FileUpdateResult) {
        self.files.push(file);
    }

    /// Returns the total number of files processed
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }

    /// Returns the total number of files modified
    pub fn files_modified(&self) -> usize {
        self.files.iter().filter(|m| m.modified).count()
    }

    /// Returns the total number of declarations updated
    pub fn total_updates(&self) -> usize {
        self.files.iter().map(|m| m.update_count()).sum()
    }

    /// Returns the total number of declarations skipped
    pub fn total_skips(&self) -> usize {
        self.files.iter().map(|m| m.skip_count()).sum()
    }

    /// Returns the total number of declarations seen
    pub fn total_declarations(&self) -> usize {
        self.files.iter().map(|m| m.results.len()).sum()
    }

    /// Returns true if any files were modified
    pub fn has_changes(&self) -> bool {
        self.files_modified() > 0
    }

    /// Returns all results of one kind across all files
    pub fn by_kind(&self, kind: DeclarationKind) -> impl Iterator<Item = &UpdateResult> {
        self.files
            .iter()
            .flat_map(|f| f.results.iter())
            .filter(move |r| r.declaration().kind == kind)
    }

    /// Returns all updates across all files
    pub fn all_updates(&self) -> impl Iterator<Item = &UpdateResult> {
        self.files.iter().flat_map(|m| m.updates())
    }
}

impl Default for UpdateSummary {
    fn default() -> Self {
        Self::new(false)
    }
}
