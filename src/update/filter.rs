//! Update filter configuration
//!
//! This module provides the UpdateFilter struct that encapsulates
//! all filter options for update judgment.

use crate::domain::{Declaration, DeclarationKind};

/// Filter configuration for update judgment
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Declaration kinds to process (empty means all)
    pub kinds: Vec<DeclarationKind>,
    /// Names or sources to exclude from updates
    pub exclude: Vec<String>,
    /// If non-empty, only update these names or sources
    pub only: Vec<String>,
}

impl UpdateFilter {
    /// Create a new UpdateFilter with default settings (process all)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set kinds to process
    pub fn with_kinds(mut self, kinds: Vec<DeclarationKind>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Set names to exclude
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set names to include (only list)
    pub fn with_only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    /// Check if a kind should be processed
    pub fn should_process_kind(&self, kind: DeclarationKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }

    /// Check if a declaration passes the only/exclude lists
    ///
    /// Entries match either the declaration name or its source address.
    pub fn should_process_declaration(&self, declaration: &Declaration) -> bool {
        let matches = |pattern: &String| {
            pattern == &declaration.name || declaration.source.as_deref() == Some(pattern.as_str())
        };
        if !self.only.is_empty() {
            return self.only.iter().any(matches);
        }
        !self.exclude.iter().any(matches)
    }
}
