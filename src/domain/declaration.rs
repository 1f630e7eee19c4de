//! Version-bearing declarations extracted from Terraform files

use super::DeclarationKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace assumed for providers declared without an explicit source
pub const DEFAULT_PROVIDER_NAMESPACE: &str = "hashicorp";

/// Identity of a declaration within a single file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclarationKey {
    pub kind: DeclarationKind,
    pub name: String,
}

impl DeclarationKey {
    pub fn new(kind: DeclarationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for DeclarationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.name)
    }
}

/// A `required_providers` entry as written in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequirement {
    /// `aws = ">= 4.0"`
    Simple(String),
    /// `aws = { source = "hashicorp/aws", version = "~> 5.0" }`
    Sourced {
        source: Option<String>,
        version: Option<String>,
    },
}

impl ProviderRequirement {
    /// Normalizes the entry into a provider declaration
    ///
    /// A bare constraint or an object without `source` implies the
    /// `hashicorp/<local name>` source address.
    pub fn into_declaration(self, local_name: &str) -> Declaration {
        let implied_source = || format!("{}/{}", DEFAULT_PROVIDER_NAMESPACE, local_name);
        match self {
            ProviderRequirement::Simple(constraint) => {
                Declaration::provider(local_name, implied_source(), Some(constraint))
            }
            ProviderRequirement::Sourced { source, version } => Declaration::provider(
                local_name,
                source.unwrap_or_else(implied_source),
                version,
            ),
        }
    }
}

/// A named reference to a module, provider or the Terraform version itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declaration kind
    pub kind: DeclarationKind,
    /// Module label, provider local name, or `terraform`
    pub name: String,
    /// Source address with any `?ref=` marker removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Value of the `version` (or `required_version`) attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Value of the `?ref=` marker embedded in the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

impl Declaration {
    /// Creates a module declaration
    pub fn module(
        name: impl Into<String>,
        source: impl Into<String>,
        version: Option<String>,
        source_ref: Option<String>,
    ) -> Self {
        Self {
            kind: DeclarationKind::Module,
            name: name.into(),
            source: Some(source.into()),
            version,
            source_ref,
        }
    }

    /// Creates a provider declaration
    pub fn provider(
        name: impl Into<String>,
        source: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            kind: DeclarationKind::Provider,
            name: name.into(),
            source: Some(source.into()),
            version,
            source_ref: None,
        }
    }

    /// Creates the `required_version` declaration
    pub fn terraform(required_version: impl Into<String>) -> Self {
        Self {
            kind: DeclarationKind::Terraform,
            name: "terraform".to_string(),
            source: None,
            version: Some(required_version.into()),
            source_ref: None,
        }
    }

    /// Returns the identity used to match resolved versions back to the file
    pub fn key(&self) -> DeclarationKey {
        DeclarationKey::new(self.kind, self.name.clone())
    }

    /// Returns the effective current version
    ///
    /// An explicit `version` attribute takes precedence over a `?ref=` marker.
    pub fn current_version(&self) -> Option<&str> {
        self.version.as_deref().or(self.source_ref.as_deref())
    }

    /// Returns the current version or a placeholder for display
    pub fn current_version_display(&self) -> &str {
        self.current_version().unwrap_or("(none)")
    }

    /// Returns true if the source carries a `?ref=` marker
    pub fn has_ref_marker(&self) -> bool {
        self.source_ref.is_some()
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.name)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        write!(f, " @ {}", self.current_version_display())
    }
}
