//! Declaration kinds handled by tfau

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of version-bearing declarations in a Terraform file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    /// `module "<name>" { source, version }`
    Module,
    /// `provider "<name>"` blocks and `required_providers` entries
    Provider,
    /// `terraform { required_version }`
    Terraform,
}

impl DeclarationKind {
    /// All kinds, in processing order
    pub const ALL: [DeclarationKind; 3] = [
        DeclarationKind::Module,
        DeclarationKind::Provider,
        DeclarationKind::Terraform,
    ];

    /// Returns the display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            DeclarationKind::Module => "Module",
            DeclarationKind::Provider => "Provider",
            DeclarationKind::Terraform => "Terraform",
        }
    }

    /// Returns the lowercase identifier used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Module => "module",
            DeclarationKind::Provider => "provider",
            DeclarationKind::Terraform => "terraform",
        }
    }

    /// Parses a comma separated list such as `modules,providers`
    pub fn parse_list(value: &str) -> Result<Vec<DeclarationKind>, ConfigError> {
        let mut kinds = Vec::new();
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let kind: DeclarationKind = part.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Err(ConfigError::EmptyUpgrades);
        }
        Ok(kinds)
    }
}

impl FromStr for DeclarationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "module" | "modules" => Ok(DeclarationKind::Module),
            "provider" | "providers" => Ok(DeclarationKind::Provider),
            "terraform" => Ok(DeclarationKind::Terraform),
            _ => Err(ConfigError::InvalidUpgradeKind {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_plural_and_singular() {
        assert_eq!("modules".parse::<DeclarationKind>().unwrap(), DeclarationKind::Module);
        assert_eq!("provider".parse::<DeclarationKind>().unwrap(), DeclarationKind::Provider);
        assert_eq!("Terraform".parse::<DeclarationKind>().unwrap(), DeclarationKind::Terraform);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "packages".parse::<DeclarationKind>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUpgradeKind { .. }));
    }

    #[test]
    fn test_parse_list() {
        let kinds = DeclarationKind::parse_list("modules, terraform").unwrap();
        assert_eq!(kinds, vec![DeclarationKind::Module, DeclarationKind::Terraform]);
    }

    #[test]
    fn test_parse_list_deduplicates() {
        let kinds = DeclarationKind::parse_list("providers,provider").unwrap();
        assert_eq!(kinds, vec![DeclarationKind::Provider]);
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(matches!(
            DeclarationKind::parse_list(" , "),
            Err(ConfigError::EmptyUpgrades)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(DeclarationKind::Module.to_string(), "Module");
        assert_eq!(DeclarationKind::Terraform.as_str(), "terraform");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DeclarationKind::Provider).unwrap();
        assert_eq!(json, "\"provider\"");
    }
}
