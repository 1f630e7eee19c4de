//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Human-readable update result display with colors
//! - Semantic version change type indication (major/minor/patch)
//! - Skipped declaration display with reasons
//! - Summary with a per-kind breakdown

use crate::domain::{DeclarationKind, FileUpdateResult, SkipReason, UpdateResult, UpdateSummary};
use crate::orchestrator::OrchestratorResult;
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

/// Width of the kind column, wide enough for "terraform"
const KIND_WIDTH: usize = 9;

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two versions
    ///
    /// Accepts constraint strings such as `~> 5.0` or `>= 1.5.0, < 2.0.0`;
    /// only the first clause is compared.
    pub fn from_versions(old: &str, new: &str) -> Self {
        let parse = |v: &str| -> Option<(u64, u64, u64)> {
            let v = v.split(',').next()?.trim();
            let v = v.trim_start_matches(|c: char| "~>=<!^ ".contains(c));
            let v = v.strip_prefix('v').unwrap_or(v);
            // Split by . and - to handle prerelease suffixes
            let parts: Vec<&str> = v.split(['.', '-']).collect();
            if parts.len() >= 3 {
                Some((
                    parts[0].parse().ok()?,
                    parts[1].parse().ok()?,
                    parts[2].parse().ok()?,
                ))
            } else if parts.len() == 2 {
                Some((parts[0].parse().ok()?, parts[1].parse().ok()?, 0))
            } else if parts.len() == 1 {
                Some((parts[0].parse().ok()?, 0, 0))
            } else {
                None
            }
        };

        match (parse(old), parse(new)) {
            (Some((old_major, old_minor, _)), Some((new_major, new_minor, _))) => {
                if new_major != old_major {
                    VersionChangeType::Major
                } else if new_minor != old_minor {
                    VersionChangeType::Minor
                } else {
                    VersionChangeType::Patch
                }
            }
            _ => VersionChangeType::Unknown,
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether this is a dry-run
    dry_run: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> String {
        if self.dry_run {
            if self.color {
                format!("{} ", "(dry-run)".cyan())
            } else {
                "(dry-run) ".to_string()
            }
        } else {
            String::new()
        }
    }

    /// Short skip reason for the verbose listing
    fn format_skip_reason(&self, reason: &SkipReason) -> String {
        match reason {
            SkipReason::AlreadyLatest => "latest".to_string(),
            SkipReason::Excluded => "excluded".to_string(),
            SkipReason::NotInOnlyList => "not in --only".to_string(),
            SkipReason::KindFiltered => "filtered".to_string(),
            SkipReason::NoVersionConstraint => "no version".to_string(),
            SkipReason::UnsupportedSource(msg) => format!("unsupported: {}", msg),
            SkipReason::FetchFailed(msg) => format!("fetch failed: {}", msg),
            SkipReason::NoVersionsFound => "no versions found".to_string(),
        }
    }

    /// Reason bucket used in the summary counts; drops per-item details
    fn skip_reason_bucket(reason: &SkipReason) -> &'static str {
        match reason {
            SkipReason::AlreadyLatest => "latest",
            SkipReason::Excluded => "excluded",
            SkipReason::NotInOnlyList => "not in --only",
            SkipReason::KindFiltered => "filtered",
            SkipReason::NoVersionConstraint => "no version",
            SkipReason::UnsupportedSource(_) => "unsupported",
            SkipReason::FetchFailed(_) => "fetch failed",
            SkipReason::NoVersionsFound => "no versions found",
        }
    }

    /// Calculate the maximum declaration name length for alignment
    fn max_name_length(&self, results: &[&UpdateResult]) -> usize {
        results.iter().map(|r| r.name().len()).max().unwrap_or(0)
    }

    fn kind_label(&self, kind: DeclarationKind) -> String {
        let label = format!("{:width$}", kind.as_str(), width = KIND_WIDTH);
        if self.color {
            label.cyan().to_string()
        } else {
            label
        }
    }

    /// Format a single update line
    fn format_update_line(
        &self,
        result: &UpdateResult,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let declaration = result.declaration();
        let old_version = declaration.current_version_display();
        let new_version = result.display_version().unwrap_or_default();
        let change_type = VersionChangeType::from_versions(old_version, new_version);
        let kind = self.kind_label(declaration.kind);

        if self.color {
            let name_display = format!("{:width$}", declaration.name, width = max_name_len);
            writeln!(
                writer,
                "  {} {} {} {} {} [{}]",
                kind,
                name_display,
                old_version.dimmed(),
                "→".dimmed(),
                new_version.bright_white().bold(),
                change_type.colored_label(),
            )
        } else {
            writeln!(
                writer,
                "  {} {:width$} {} -> {} [{}]",
                kind,
                declaration.name,
                old_version,
                new_version,
                change_type.label(),
                width = max_name_len
            )
        }
    }

    /// Format a single skip line
    fn format_skip_line(
        &self,
        result: &UpdateResult,
        reason: &SkipReason,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let reason_str = self.format_skip_reason(reason);
        let kind = self.kind_label(result.declaration().kind);

        if self.color {
            let name_display = format!("{:width$}", result.name(), width = max_name_len);
            writeln!(
                writer,
                "  {} {} {}",
                kind,
                name_display.dimmed(),
                format!("({})", reason_str).dimmed()
            )
        } else {
            writeln!(
                writer,
                "  {} {:width$} ({})",
                kind,
                result.name(),
                reason_str,
                width = max_name_len
            )
        }
    }

    fn format_file_block(
        &self,
        file: &FileUpdateResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let updates: Vec<_> = file.updates().collect();
        let skips: Vec<_> = file.skips().collect();

        if updates.is_empty() && (self.verbosity != Verbosity::Verbose || skips.is_empty()) {
            return Ok(());
        }

        let prefix = self.dry_run_prefix();
        let update_count = updates.len();
        let skip_count = skips.len();
        let path_display = file.path.display().to_string();

        if self.color {
            write!(writer, "{}", prefix)?;
            write!(writer, "{}", path_display.bold())?;
            writeln!(
                writer,
                " — {} {}, {} {}",
                update_count.to_string().green(),
                if update_count == 1 {
                    "update"
                } else {
                    "updates"
                },
                skip_count.to_string().dimmed(),
                if skip_count == 1 { "skip" } else { "skips" }
            )?;
        } else {
            writeln!(
                writer,
                "{}{} — {} updates, {} skips",
                prefix, path_display, update_count, skip_count
            )?;
        }

        let max_name_len = self.max_name_length(&updates).max(20);
        for result in &updates {
            self.format_update_line(result, max_name_len, writer)?;
        }

        if self.verbosity == Verbosity::Verbose && !skips.is_empty() {
            writeln!(writer)?;
            if self.color {
                writeln!(writer, "  {}", "Skipped:".dimmed())?;
            } else {
                writeln!(writer, "  Skipped:")?;
            }
            let skip_max_len = self.max_name_length(&skips).max(20);
            for result in &skips {
                if let UpdateResult::Skip { reason, .. } = result {
                    self.format_skip_line(result, reason, skip_max_len, writer)?;
                }
            }
        }

        writeln!(writer)?;
        Ok(())
    }

    /// Count updates by change type
    fn count_by_change_type(&self, summary: &UpdateSummary) -> (usize, usize, usize, usize) {
        let mut major = 0;
        let mut minor = 0;
        let mut patch = 0;
        let mut unknown = 0;

        for result in summary.all_updates() {
            let old = result.declaration().current_version_display();
            let new = result.display_version().unwrap_or_default();
            match VersionChangeType::from_versions(old, new) {
                VersionChangeType::Major => major += 1,
                VersionChangeType::Minor => minor += 1,
                VersionChangeType::Patch => patch += 1,
                VersionChangeType::Unknown => unknown += 1,
            }
        }

        (major, minor, patch, unknown)
    }

    /// Count skips by reason, largest first
    fn count_by_skip_reason(&self, summary: &UpdateSummary) -> Vec<(&'static str, usize)> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();

        for file in &summary.files {
            for result in file.skips() {
                if let UpdateResult::Skip { reason, .. } = result {
                    *counts.entry(Self::skip_reason_bucket(reason)).or_insert(0) += 1;
                }
            }
        }

        let mut result: Vec<_> = counts.into_iter().collect();
        result.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        result
    }

    fn change_type_parts(&self, counts: (usize, usize, usize, usize)) -> Vec<String> {
        let (major, minor, patch, unknown) = counts;
        let mut parts = Vec::new();
        if self.color {
            if major > 0 {
                parts.push(format!("{} major", major.to_string().red()));
            }
            if minor > 0 {
                parts.push(format!("{} minor", minor.to_string().yellow()));
            }
            if patch > 0 {
                parts.push(format!("{} patch", patch.to_string().green()));
            }
            if unknown > 0 {
                parts.push(format!("{} other", unknown.to_string().dimmed()));
            }
        } else {
            if major > 0 {
                parts.push(format!("{} major", major));
            }
            if minor > 0 {
                parts.push(format!("{} minor", minor));
            }
            if patch > 0 {
                parts.push(format!("{} patch", patch));
            }
            if unknown > 0 {
                parts.push(format!("{} other", unknown));
            }
        }
        parts
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(&result.summary, writer);
        }

        for file in &result.summary.files {
            self.format_file_block(file, writer)?;
        }

        if !result.errors.is_empty() {
            if self.color {
                writeln!(writer, "{}:", "Errors".red().bold())?;
            } else {
                writeln!(writer, "Errors:")?;
            }
            for error in &result.errors {
                if self.color {
                    writeln!(writer, "  {} {}", "✗".red(), error)?;
                } else {
                    writeln!(writer, "  - {}", error)?;
                }
            }
            writeln!(writer)?;
        }

        self.format_summary(&result.summary, writer)
    }

    fn format_summary(
        &self,
        summary: &UpdateSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        let updates = summary.total_updates();
        let skips = summary.total_skips();

        if self.verbosity == Verbosity::Quiet {
            if updates > 0 {
                if self.color {
                    writeln!(writer, "{}{} updated", prefix, updates.to_string().green())?;
                } else {
                    writeln!(writer, "{}{} updated", prefix, updates)?;
                }
            } else if self.color {
                writeln!(writer, "{}{}", prefix, "No updates".dimmed())?;
            } else {
                writeln!(writer, "{}No updates", prefix)?;
            }
            return Ok(());
        }

        let parts = self.change_type_parts(self.count_by_change_type(summary));
        let files_modified = summary.files_modified();
        let files_verb = if summary.dry_run {
            "would be modified"
        } else {
            "modified"
        };

        if self.color {
            writeln!(writer, "{}{}:", prefix, "Summary".bold())?;
            if updates > 0 {
                writeln!(
                    writer,
                    "  {} declaration(s) updated ({})",
                    updates.to_string().green(),
                    parts.join(", ")
                )?;
            } else {
                writeln!(writer, "  {}", "No declarations updated".dimmed())?;
            }

            if skips > 0 {
                write!(
                    writer,
                    "  {} declaration(s) skipped",
                    skips.to_string().dimmed()
                )?;
                if self.verbosity == Verbosity::Verbose {
                    let skip_counts = self.count_by_skip_reason(summary);
                    if !skip_counts.is_empty() {
                        let parts: Vec<_> = skip_counts
                            .iter()
                            .map(|(reason, count)| format!("{} {}", count, reason))
                            .collect();
                        write!(writer, " ({})", parts.join(", ").dimmed())?;
                    }
                }
                writeln!(writer)?;
            }

            writeln!(
                writer,
                "  {} of {} file(s) {}",
                files_modified.to_string().bold(),
                summary.files_processed(),
                files_verb
            )?;
        } else {
            writeln!(writer, "{}Summary:", prefix)?;
            if updates > 0 {
                writeln!(
                    writer,
                    "  {} declaration(s) updated ({})",
                    updates,
                    parts.join(", ")
                )?;
            } else {
                writeln!(writer, "  No declarations updated")?;
            }
            write!(writer, "  {} declaration(s) skipped", skips)?;
            if self.verbosity == Verbosity::Verbose && skips > 0 {
                let parts: Vec<_> = self
                    .count_by_skip_reason(summary)
                    .iter()
                    .map(|(reason, count)| format!("{} {}", count, reason))
                    .collect();
                write!(writer, " ({})", parts.join(", "))?;
            }
            writeln!(writer)?;
            writeln!(
                writer,
                "  {} of {} file(s) {}",
                files_modified,
                summary.files_processed(),
                files_verb
            )?;
        }

        if self.verbosity == Verbosity::Verbose {
            writeln!(writer)?;
            if self.color {
                writeln!(writer, "{}:", "By kind".dimmed())?;
            } else {
                writeln!(writer, "By kind:")?;
            }
            for kind in DeclarationKind::ALL {
                let results: Vec<_> = summary.by_kind(kind).collect();
                if results.is_empty() {
                    continue;
                }
                let kind_updates = results.iter().filter(|r| r.is_update()).count();
                let kind_skips = results.len() - kind_updates;
                if self.color {
                    writeln!(
                        writer,
                        "  {}: {} updated, {} skipped",
                        kind.display_name().cyan(),
                        kind_updates.to_string().green(),
                        kind_skips.to_string().dimmed()
                    )?;
                } else {
                    writeln!(
                        writer,
                        "  {}: {} updated, {} skipped",
                        kind.display_name(),
                        kind_updates,
                        kind_skips
                    )?;
                }
            }
        }

        Ok(())
    }

    fn format_file(&self, file: &FileUpdateResult, writer: &mut dyn Write) -> std::io::Result<()> {
        self.format_file_block(file, writer)
    }
}
