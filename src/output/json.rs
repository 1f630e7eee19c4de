//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of update results
//! - Structured file-by-file update/skip information

use crate::domain::{DeclarationKind, FileUpdateResult, SkipReason, UpdateResult, UpdateSummary};
use crate::orchestrator::OrchestratorResult;
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full result
#[derive(Serialize)]
struct JsonOutput {
    /// Whether this was a dry-run
    dry_run: bool,
    /// Summary statistics
    summary: JsonSummary,
    /// Per-file results
    files: Vec<JsonFile>,
    /// Errors encountered
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    /// Total number of updates
    updates: usize,
    /// Total number of skips
    skips: usize,
    /// Number of files processed
    files_processed: usize,
    /// Number of files modified (or that would be, in a dry-run)
    files_modified: usize,
    /// Breakdown by declaration kind
    #[serde(skip_serializing_if = "Vec::is_empty")]
    by_kind: Vec<JsonKindSummary>,
}

#[derive(Serialize)]
struct JsonKindSummary {
    kind: &'static str,
    updates: usize,
    skips: usize,
}

/// JSON representation of a file result
#[derive(Serialize)]
struct JsonFile {
    /// Path to the `.tf` file
    path: String,
    /// Whether the file has (or would have) changes
    modified: bool,
    /// List of updates
    updates: Vec<JsonUpdate>,
    /// List of skips (only in verbose mode)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skips: Vec<JsonSkip>,
}

/// JSON representation of an update
#[derive(Serialize)]
struct JsonUpdate {
    /// Declaration kind
    kind: &'static str,
    /// Module label, provider local name or "terraform"
    name: String,
    /// Source address, when the declaration has one
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    /// Old version
    from: String,
    /// New version
    to: String,
    /// New `?ref=` value for VCS sources
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

/// JSON representation of a skip
#[derive(Serialize)]
struct JsonSkip {
    kind: &'static str,
    name: String,
    /// Current version, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    reason: String,
}

impl JsonFormatter {
    /// Convert skip reason to string
    fn skip_reason_to_string(reason: &SkipReason) -> String {
        match reason {
            SkipReason::AlreadyLatest => "already_latest".to_string(),
            SkipReason::Excluded => "excluded".to_string(),
            SkipReason::NotInOnlyList => "not_in_only_list".to_string(),
            SkipReason::KindFiltered => "kind_filtered".to_string(),
            SkipReason::NoVersionConstraint => "no_version_constraint".to_string(),
            SkipReason::UnsupportedSource(msg) => format!("unsupported_source: {}", msg),
            SkipReason::FetchFailed(msg) => format!("fetch_failed: {}", msg),
            SkipReason::NoVersionsFound => "no_versions_found".to_string(),
        }
    }

    /// Convert file result to JSON representation
    fn file_to_json(&self, file: &FileUpdateResult) -> JsonFile {
        let updates: Vec<JsonUpdate> = file
            .updates()
            .filter_map(|result| {
                if let UpdateResult::Update {
                    declaration,
                    new_ref,
                    ..
                } = result
                {
                    Some(JsonUpdate {
                        kind: declaration.kind.as_str(),
                        name: declaration.name.clone(),
                        source: declaration.source.clone(),
                        from: declaration.current_version_display().to_string(),
                        to: result.display_version().unwrap_or_default().to_string(),
                        reference: new_ref.clone(),
                    })
                } else {
                    None
                }
            })
            .collect();

        let skips: Vec<JsonSkip> = if self.verbosity == Verbosity::Verbose {
            file.skips()
                .filter_map(|result| {
                    if let UpdateResult::Skip {
                        declaration,
                        reason,
                    } = result
                    {
                        Some(JsonSkip {
                            kind: declaration.kind.as_str(),
                            name: declaration.name.clone(),
                            version: declaration.current_version().map(str::to_string),
                            reason: Self::skip_reason_to_string(reason),
                        })
                    } else {
                        None
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        JsonFile {
            path: file.path.display().to_string(),
            modified: file.modified,
            updates,
            skips,
        }
    }

    fn summary_to_json(&self, summary: &UpdateSummary) -> JsonSummary {
        let by_kind = if self.verbosity == Verbosity::Verbose {
            DeclarationKind::ALL
                .iter()
                .filter_map(|kind| {
                    let results: Vec<_> = summary.by_kind(*kind).collect();
                    if results.is_empty() {
                        return None;
                    }
                    let updates = results.iter().filter(|r| r.is_update()).count();
                    Some(JsonKindSummary {
                        kind: kind.as_str(),
                        updates,
                        skips: results.len() - updates,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        JsonSummary {
            updates: summary.total_updates(),
            skips: summary.total_skips(),
            files_processed: summary.files_processed(),
            files_modified: summary.files_modified(),
            by_kind,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonOutput {
            dry_run: result.summary.dry_run,
            summary: self.summary_to_json(&result.summary),
            files: result
                .summary
                .files
                .iter()
                .map(|f| self.file_to_json(f))
                .collect(),
            errors: result.errors.iter().map(|e| e.to_string()).collect(),
        };

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)?;

        Ok(())
    }

    fn format_summary(
        &self,
        summary: &UpdateSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = self.summary_to_json(summary);

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)?;

        Ok(())
    }

    fn format_file(&self, file: &FileUpdateResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = self.file_to_json(file);

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)?;

        Ok(())
    }
}
