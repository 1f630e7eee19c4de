//! Update judgment logic for declarations
//!
//! This module provides:
//! - Update filter configuration from CLI args
//! - Version resolution over raw backend candidates
//! - Update judgment engine that decides whether to update or skip

mod filter;
mod resolver;

pub use filter::UpdateFilter;
pub use resolver::{resolve_latest, ResolveOptions, VersionCandidate, VersionPrecision};

use crate::domain::{classify_source, Declaration, DeclarationKind, SkipReason, SourceKind, UpdateResult};

/// Update judgment engine that decides whether to update a declaration
pub struct UpdateJudge {
    /// Filter configuration
    filter: UpdateFilter,
    /// How resolved versions are written to `version` attributes
    precision: VersionPrecision,
}

impl UpdateJudge {
    /// Create a new UpdateJudge with the given filter
    pub fn new(filter: UpdateFilter) -> Self {
        Self {
            filter,
            precision: VersionPrecision::default(),
        }
    }

    /// Set the output precision
    pub fn with_precision(mut self, precision: VersionPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Check if a declaration should be processed at all
    /// Returns Some(SkipReason) if it should be skipped, None if it should be resolved
    pub fn should_skip(&self, declaration: &Declaration) -> Option<SkipReason> {
        if !self.filter.should_process_kind(declaration.kind) {
            return Some(SkipReason::KindFiltered);
        }

        if !self.filter.should_process_declaration(declaration) {
            if !self.filter.only.is_empty() {
                return Some(SkipReason::NotInOnlyList);
            } else {
                return Some(SkipReason::Excluded);
            }
        }

        match declaration.kind {
            DeclarationKind::Module => {
                let source = classify_source(declaration.source.as_deref().unwrap_or_default());
                match source.kind {
                    SourceKind::Unsupported => {
                        Some(SkipReason::UnsupportedSource(source.to_string()))
                    }
                    // Registry modules without `version` always track the latest release
                    SourceKind::Registry if declaration.version.is_none() => {
                        Some(SkipReason::NoVersionConstraint)
                    }
                    _ => None,
                }
            }
            DeclarationKind::Provider | DeclarationKind::Terraform
                if declaration.version.is_none() =>
            {
                Some(SkipReason::NoVersionConstraint)
            }
            _ => None,
        }
    }

    /// Judge whether to update a declaration given its resolved latest version
    pub fn judge(&self, declaration: &Declaration, latest: &VersionCandidate) -> UpdateResult {
        if let Some(reason) = self.should_skip(declaration) {
            return UpdateResult::skip(declaration.clone(), reason);
        }

        // Never move backwards from an exact version newer than the resolved one
        if let Some(current) = declaration.current_version().and_then(VersionCandidate::parse) {
            if current.version > latest.version {
                return UpdateResult::skip(declaration.clone(), SkipReason::AlreadyLatest);
            }
        }

        let new_version = latest.render(self.precision);
        let version_changed = declaration
            .version
            .as_deref()
            .is_some_and(|v| v != new_version);

        let is_vcs_module = declaration.kind == DeclarationKind::Module
            && classify_source(declaration.source.as_deref().unwrap_or_default())
                .kind
                .is_vcs();

        if is_vcs_module {
            let ref_changed = declaration.source_ref.as_deref() != Some(latest.raw.as_str());
            if !version_changed && !ref_changed {
                return UpdateResult::skip(declaration.clone(), SkipReason::AlreadyLatest);
            }
            return UpdateResult::update_with_ref(declaration.clone(), new_version, &latest.raw);
        }

        if !version_changed {
            return UpdateResult::skip(declaration.clone(), SkipReason::AlreadyLatest);
        }
        UpdateResult::update(declaration.clone(), new_version)
    }

    /// Judge an update to a caller-supplied value (e.g. `--terraform-version`)
    pub fn judge_fixed(&self, declaration: &Declaration, value: &str) -> UpdateResult {
        if let Some(reason) = self.should_skip(declaration) {
            return UpdateResult::skip(declaration.clone(), reason);
        }
        if declaration.version.as_deref() == Some(value) {
            return UpdateResult::skip(declaration.clone(), SkipReason::AlreadyLatest);
        }
        UpdateResult::update(declaration.clone(), value)
    }
}
