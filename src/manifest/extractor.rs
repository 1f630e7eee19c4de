//! Declaration extraction from Terraform configuration
//!
//! Reads the top-level block structure and decodes only the attributes that
//! carry versions:
//! - `module "<name>" { source, version }`
//! - `provider "<name>" { version }`
//! - `terraform { required_version, required_providers { ... } }`
//!
//! Values that are not plain string literals are logged and skipped.

use crate::domain::{normalize_scp_like, split_ref_marker, Declaration, ProviderRequirement};
use crate::error::ManifestError;
use hcl::{Block, Body, Expression};
use std::collections::HashSet;

/// Block types that never carry versions
const IGNORED_BLOCKS: &[&str] = &[
    "resource", "data", "variable", "output", "locals", "moved", "import", "check", "removed",
];

/// Extracts all version-bearing declarations from `content`
///
/// A provider declared both in a `provider` block and in `required_providers`
/// yields a single declaration taken from `required_providers`.
pub fn extract_declarations(content: &str) -> Result<Vec<Declaration>, ManifestError> {
    let body = hcl::parse(content).map_err(|e| ManifestError::parse_error("", e.to_string()))?;

    let required_names = required_provider_names(&body);
    let mut declarations: Vec<Declaration> = Vec::new();
    let mut terraform_seen = false;

    for block in body.blocks() {
        match block.identifier() {
            "module" => {
                if let Some(decl) = extract_module(block) {
                    push_unique(&mut declarations, decl);
                }
            }
            "provider" => {
                let Some(name) = first_label(block) else {
                    tracing::warn!("provider block without a name, skipping");
                    continue;
                };
                if required_names.contains(name) {
                    continue;
                }
                if let Some(version) = string_attribute(block.body(), "version", name) {
                    push_unique(
                        &mut declarations,
                        ProviderRequirement::Simple(version).into_declaration(name),
                    );
                }
            }
            "terraform" => {
                if let Some(version) = string_attribute(block.body(), "required_version", "terraform")
                {
                    if terraform_seen {
                        tracing::warn!("multiple required_version attributes, keeping the first");
                    } else {
                        terraform_seen = true;
                        declarations.push(Declaration::terraform(version));
                    }
                }
                for nested in block.body().blocks() {
                    if nested.identifier() == "required_providers" {
                        for decl in extract_required_providers(nested) {
                            push_unique(&mut declarations, decl);
                        }
                    }
                }
            }
            ident if IGNORED_BLOCKS.contains(&ident) => {}
            other => tracing::debug!(block = other, "ignoring unknown block type"),
        }
    }

    Ok(declarations)
}

fn push_unique(declarations: &mut Vec<Declaration>, decl: Declaration) {
    if declarations.iter().any(|d| d.key() == decl.key()) {
        tracing::warn!(declaration = %decl.key(), "duplicate declaration, keeping the first");
        return;
    }
    declarations.push(decl);
}

fn first_label(block: &Block) -> Option<&str> {
    block.labels().first().map(|label| label.as_str())
}

fn literal(expr: &Expression) -> Option<&str> {
    match expr {
        Expression::String(value) => Some(value.as_str()),
        _ => None,
    }
}

/// Reads a string attribute; a non-literal value is logged and treated as absent
fn string_attribute(body: &Body, key: &str, owner: &str) -> Option<String> {
    let attr = body.attributes().find(|a| a.key() == key)?;
    match literal(attr.expr()) {
        Some(value) => Some(value.to_string()),
        None => {
            tracing::warn!(owner, attribute = key, "attribute is not a string literal, skipping");
            None
        }
    }
}

fn extract_module(block: &Block) -> Option<Declaration> {
    let Some(name) = first_label(block) else {
        tracing::warn!("module block without a name, skipping");
        return None;
    };
    let source = string_attribute(block.body(), "source", name)?;
    let version = string_attribute(block.body(), "version", name);

    let (source, source_ref) = split_ref_marker(&source);
    let source = normalize_scp_like(&source);
    Some(Declaration::module(name, source, version, source_ref))
}

fn required_provider_names(body: &Body) -> HashSet<String> {
    body.blocks()
        .filter(|b| b.identifier() == "terraform")
        .flat_map(|b| b.body().blocks())
        .filter(|b| b.identifier() == "required_providers")
        .flat_map(|b| b.body().attributes())
        .map(|a| a.key().to_string())
        .collect()
}

fn extract_required_providers(block: &Block) -> Vec<Declaration> {
    block
        .body()
        .attributes()
        .filter_map(|attr| {
            let name = attr.key();
            let requirement = match attr.expr() {
                Expression::String(constraint) => ProviderRequirement::Simple(constraint.clone()),
                Expression::Object(object) => {
                    let field = |field: &str| {
                        object
                            .iter()
                            .find(|(k, _)| k.to_string() == field)
                            .and_then(|(_, v)| literal(v))
                            .map(str::to_string)
                    };
                    ProviderRequirement::Sourced {
                        source: field("source"),
                        version: field("version"),
                    }
                }
                _ => {
                    tracing::warn!(provider = name, "unsupported required_providers entry, skipping");
                    return None;
                }
            };
            Some(requirement.into_declaration(name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeclarationKind;

    #[test]
    fn test_extract_registry_module() {
        let content = r#"
module "vpc" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "5.0.0"
  cidr    = "10.0.0.0/16"
}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].kind, DeclarationKind::Module);
        assert_eq!(decls[0].name, "vpc");
        assert_eq!(decls[0].source.as_deref(), Some("terraform-aws-modules/vpc/aws"));
        assert_eq!(decls[0].current_version(), Some("5.0.0"));
    }

    #[test]
    fn test_extract_git_module_with_ref() {
        let content = r#"
module "network" {
  source = "git@example.com:org/repo.git?ref=v1.0.0"
}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls[0].source.as_deref(), Some("ssh://example.com/org/repo.git"));
        assert_eq!(decls[0].current_version(), Some("v1.0.0"));
        assert!(decls[0].version.is_none());
    }

    #[test]
    fn test_extract_module_version_wins_over_ref() {
        let content = r#"
module "network" {
  source  = "git::https://example.com/network.git?ref=v1.0.0"
  version = "1.2.0"
}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls[0].current_version(), Some("1.2.0"));
        assert_eq!(decls[0].source_ref.as_deref(), Some("v1.0.0"));
    }

    #[test]
    fn test_extract_provider_block() {
        let content = r#"
provider "google" {
  project = "my-project"
  version = "4.0.0"
}

provider "random" {}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].kind, DeclarationKind::Provider);
        assert_eq!(decls[0].source.as_deref(), Some("hashicorp/google"));
        assert_eq!(decls[0].version.as_deref(), Some("4.0.0"));
    }

    #[test]
    fn test_extract_required_providers_both_shapes() {
        let content = r#"
terraform {
  required_version = ">= 1.5.0"

  required_providers {
    google = ">=4.84"
    google-beta = {
      source  = "hashicorp/google-beta"
      version = "6.22.0"
    }
  }
}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls.len(), 3);

        assert_eq!(decls[0].kind, DeclarationKind::Terraform);
        assert_eq!(decls[0].version.as_deref(), Some(">= 1.5.0"));

        assert_eq!(decls[1].name, "google");
        assert_eq!(decls[1].source.as_deref(), Some("hashicorp/google"));
        assert_eq!(decls[1].version.as_deref(), Some(">=4.84"));

        assert_eq!(decls[2].name, "google-beta");
        assert_eq!(decls[2].source.as_deref(), Some("hashicorp/google-beta"));
        assert_eq!(decls[2].version.as_deref(), Some("6.22.0"));
    }

    #[test]
    fn test_required_providers_shadow_provider_block() {
        let content = r#"
terraform {
  required_providers {
    aws = { source = "hashicorp/aws", version = "5.0.0" }
  }
}

provider "aws" {
  version = "4.0.0"
}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].version.as_deref(), Some("5.0.0"));
    }

    #[test]
    fn test_unknown_blocks_are_tolerated() {
        let content = r#"
resource "aws_s3_bucket" "b" {
  bucket = "x"
}

something_new "a" "b" {
  nested {
    deep = true
  }
}

module "vpc" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "5.0.0"
}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "vpc");
    }

    #[test]
    fn test_interpolated_values_are_skipped() {
        let content = r#"
module "dynamic" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "${var.vpc_version}"
}

module "computed" {
  source = var.source
}
"#;
        let decls = extract_declarations(content).unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "dynamic");
        assert!(decls[0].version.is_none());
    }

    #[test]
    fn test_parse_error() {
        let err = extract_declarations("module \"vpc\" {\n  source = \n").unwrap_err();
        assert!(matches!(err, ManifestError::ParseError { .. }));
    }

    #[test]
    fn test_empty_file() {
        assert!(extract_declarations("").unwrap().is_empty());
    }
}
