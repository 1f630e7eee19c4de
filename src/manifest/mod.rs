//! Terraform file discovery, extraction and rewriting
//!
//! This module provides functionality to:
//! - Find `.tf` files below a directory
//! - Extract module, provider and `required_version` declarations
//! - Rewrite version attributes in place without disturbing formatting
//! - Write updated files atomically

mod detector;
mod extractor;
mod rewriter;
mod writer;

pub use detector::{find_terraform_files, is_terraform_file, TERRAFORM_EXTENSION};
pub use extractor::extract_declarations;
pub use rewriter::{rewrite, PendingUpdate};
pub use writer::{read_manifest, write_manifest, ManifestWriter, WriteResult};

use crate::domain::Declaration;
use crate::error::ManifestError;
use std::path::Path;

/// Read and extract declarations from a Terraform file
pub fn parse_manifest(path: &Path) -> Result<Vec<Declaration>, ManifestError> {
    let content = read_manifest(path)?;
    extract_declarations(&content).map_err(|e| e.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeclarationKey, DeclarationKind};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_manifest_attaches_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.tf");
        std::fs::write(&path, "terraform {").unwrap();

        match parse_manifest(&path).unwrap_err() {
            ManifestError::ParseError { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_rewrite_then_extract_round_trip() {
        let content = r#"module "net" {
  source = "git@example.com:org/repo.git?ref=v1.0.0"
}

terraform {
  required_providers {
    aws = { source = "hashicorp/aws", version = "5.0.0" }
  }
}
"#;
        let updates: HashMap<_, _> = [
            (
                DeclarationKey::new(DeclarationKind::Module, "net"),
                PendingUpdate {
                    version: "v1.4.0".to_string(),
                    reference: Some("v1.4.0".to_string()),
                },
            ),
            (
                DeclarationKey::new(DeclarationKind::Provider, "aws"),
                PendingUpdate {
                    version: "5.31.0".to_string(),
                    reference: None,
                },
            ),
        ]
        .into_iter()
        .collect();

        let rewritten = rewrite(content, &updates).unwrap();
        let decls = extract_declarations(&rewritten).unwrap();

        let net = decls.iter().find(|d| d.name == "net").unwrap();
        assert_eq!(net.current_version(), Some("v1.4.0"));
        assert_eq!(net.source.as_deref(), Some("ssh://example.com/org/repo.git"));

        let aws = decls.iter().find(|d| d.name == "aws").unwrap();
        assert_eq!(aws.current_version(), Some("5.31.0"));

        assert_eq!(rewrite(&rewritten, &updates).unwrap(), rewritten);
    }
}
