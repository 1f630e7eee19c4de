//! Update decision result types

use super::Declaration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason why a declaration was not updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Already at the latest version
    AlreadyLatest,
    /// Excluded via --exclude
    Excluded,
    /// Not in --only list
    NotInOnlyList,
    /// Declaration kind not selected via --upgrades
    KindFiltered,
    /// No version attribute to rewrite
    NoVersionConstraint,
    /// Source address has no backend
    UnsupportedSource(String),
    /// Backend request failed
    FetchFailed(String),
    /// Backend returned no usable versions
    NoVersionsFound,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyLatest => write!(f, "already at latest"),
            SkipReason::Excluded => write!(f, "excluded by --exclude"),
            SkipReason::NotInOnlyList => write!(f, "not in --only list"),
            SkipReason::KindFiltered => write!(f, "not selected by --upgrades"),
            SkipReason::NoVersionConstraint => write!(f, "no version constraint"),
            SkipReason::UnsupportedSource(msg) => write!(f, "unsupported source: {}", msg),
            SkipReason::FetchFailed(msg) => write!(f, "fetch failed: {}", msg),
            SkipReason::NoVersionsFound => write!(f, "no versions found"),
        }
    }
}

/// Result of an update decision for a single declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateResult {
    /// Declaration will be rewritten
    Update {
        /// The declaration being updated
        declaration: Declaration,
        /// Value written to the `version`/`required_version` attribute
        new_version: String,
        /// Exact tag written to the `?ref=` marker of a VCS source
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_ref: Option<String>,
    },
    /// Declaration was left alone
    Skip {
        /// The declaration that was skipped
        declaration: Declaration,
        /// The reason for skipping
        reason: SkipReason,
    },
}

impl UpdateResult {
    /// Creates an Update result
    pub fn update(declaration: Declaration, new_version: impl Into<String>) -> Self {
        UpdateResult::Update {
            declaration,
            new_version: new_version.into(),
            new_ref: None,
        }
    }

    /// Creates an Update result that also rewrites the source's `?ref=` marker
    pub fn update_with_ref(
        declaration: Declaration,
        new_version: impl Into<String>,
        new_ref: impl Into<String>,
    ) -> Self {
        UpdateResult::Update {
            declaration,
            new_version: new_version.into(),
            new_ref: Some(new_ref.into()),
        }
    }

    /// Creates a Skip result
    pub fn skip(declaration: Declaration, reason: SkipReason) -> Self {
        UpdateResult::Skip {
            declaration,
            reason,
        }
    }

    /// Returns true if this is an update result
    pub fn is_update(&self) -> bool {
        matches!(self, UpdateResult::Update { .. })
    }

    /// Returns true if this is a skip result
    pub fn is_skip(&self) -> bool {
        matches!(self, UpdateResult::Skip { .. })
    }

    /// Returns the declaration reference
    pub fn declaration(&self) -> &Declaration {
        match self {
            UpdateResult::Update { declaration, .. } => declaration,
            UpdateResult::Skip { declaration, .. } => declaration,
        }
    }

    /// Returns the declaration name
    pub fn name(&self) -> &str {
        &self.declaration().name
    }

    /// Returns the value shown as the new version
    pub fn display_version(&self) -> Option<&str> {
        match self {
            UpdateResult::Update {
                declaration,
                new_version,
                new_ref,
            } => match (declaration.version.as_ref(), new_ref) {
                (None, Some(reference)) => Some(reference),
                _ => Some(new_version),
            },
            UpdateResult::Skip { .. } => None,
        }
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateResult::Update { declaration, .. } => write!(
                f,
                "{}: {} → {}",
                declaration.name,
                declaration.current_version_display(),
                self.display_version().unwrap_or_default()
            ),
            UpdateResult::Skip {
                declaration,
                reason,
            } => {
                write!(f, "{}: skipped ({})", declaration.name, reason)
            }
        }
    }
}
