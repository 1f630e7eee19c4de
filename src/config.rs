//! Run configuration
//!
//! This module provides:
//! - `FileConfig`: the optional `tfau.toml` file, deserialized with serde
//! - `RunConfig`: the immutable settings for one run, CLI values layered over the file

use crate::cli::CliArgs;
use crate::domain::DeclarationKind;
use crate::error::ConfigError;
use crate::manifest::find_terraform_files;
use crate::registry::{BackendUrls, DEFAULT_TIMEOUT};
use crate::update::{ResolveOptions, UpdateFilter, VersionPrecision};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the target directory
pub const CONFIG_FILE_NAME: &str = "tfau.toml";

/// Default maximum number of simultaneous lookups
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default maximum number of simultaneous lookups against one host
pub const DEFAULT_PER_HOST_CONCURRENCY: usize = 4;

/// Contents of `tfau.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub upgrades: Option<Vec<String>>,
    pub terraform_version: Option<String>,
    pub constraint: Option<bool>,
    pub stable_only: Option<bool>,
    pub exclude: Vec<String>,
    pub only: Vec<String>,
    pub registry_url: Option<String>,
    pub releases_url: Option<String>,
    pub github_api_url: Option<String>,
    pub github_releases: Option<bool>,
    pub concurrency: Option<usize>,
    pub per_host_concurrency: Option<usize>,
    /// Per-request timeout in seconds
    pub timeout: Option<u64>,
}

impl FileConfig {
    /// Parse config file content; `path` only labels errors
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::InvalidConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Locate the config file for a run
    ///
    /// An explicit `--config` must exist; the implicit `tfau.toml` is optional.
    pub fn discover(args: &CliArgs) -> Result<Self, ConfigError> {
        if let Some(path) = &args.config {
            return Self::load(path);
        }
        let implicit = args.path.join(CONFIG_FILE_NAME);
        if args.path.is_dir() && implicit.is_file() {
            tracing::info!(path = %implicit.display(), "using config file");
            return Self::load(&implicit);
        }
        Ok(Self::default())
    }
}

/// Immutable settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory searched when no explicit files are given
    pub root: PathBuf,
    /// Explicit files (`-f`); bypasses discovery when non-empty
    pub files: Vec<PathBuf>,
    /// Declaration kinds to upgrade
    pub kinds: Vec<DeclarationKind>,
    /// Fixed `required_version` value instead of a releases lookup
    pub terraform_version: Option<String>,
    pub precision: VersionPrecision,
    pub stable_only: bool,
    pub dry_run: bool,
    pub exclude: Vec<String>,
    pub only: Vec<String>,
    pub urls: BackendUrls,
    pub github_releases: bool,
    pub concurrency: usize,
    pub per_host_concurrency: usize,
    pub timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            files: Vec::new(),
            kinds: DeclarationKind::ALL.to_vec(),
            terraform_version: None,
            precision: VersionPrecision::Exact,
            stable_only: false,
            dry_run: false,
            exclude: Vec::new(),
            only: Vec::new(),
            urls: BackendUrls::default(),
            github_releases: false,
            concurrency: DEFAULT_CONCURRENCY,
            per_host_concurrency: DEFAULT_PER_HOST_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RunConfig {
    /// Build the run configuration from CLI args and the discovered config file
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        let file = FileConfig::discover(args)?;
        Self::merge(args, file)
    }

    /// Layer CLI values over file values
    pub fn merge(args: &CliArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let kinds = match (&args.upgrades, &file.upgrades) {
            (Some(cli), _) => DeclarationKind::parse_list(cli)?,
            (None, Some(list)) => DeclarationKind::parse_list(&list.join(","))?,
            (None, None) => defaults.kinds,
        };

        let terraform_version = args.terraform_version.clone().or(file.terraform_version);
        if terraform_version.is_some() && !kinds.contains(&DeclarationKind::Terraform) {
            return Err(ConfigError::ConflictingOptions {
                message: "--terraform-version requires 'terraform' in --upgrades".to_string(),
            });
        }

        let constraint = args.constraint || file.constraint.unwrap_or(false);
        let precision = if constraint {
            VersionPrecision::Compatible
        } else {
            VersionPrecision::Exact
        };

        let concurrency = args
            .concurrency
            .or(file.concurrency)
            .unwrap_or(defaults.concurrency);
        let per_host_concurrency = file
            .per_host_concurrency
            .unwrap_or(defaults.per_host_concurrency);
        if concurrency == 0 || per_host_concurrency == 0 {
            return Err(ConfigError::ConflictingOptions {
                message: "concurrency limits must be at least 1".to_string(),
            });
        }

        let urls = BackendUrls {
            registry: args
                .registry_url
                .clone()
                .or(file.registry_url)
                .unwrap_or(defaults.urls.registry),
            releases: args
                .releases_url
                .clone()
                .or(file.releases_url)
                .unwrap_or(defaults.urls.releases),
            github_api: args
                .github_api_url
                .clone()
                .or(file.github_api_url)
                .unwrap_or(defaults.urls.github_api),
        };

        Ok(Self {
            root: args.path.clone(),
            files: args.files.clone(),
            kinds,
            terraform_version,
            precision,
            stable_only: args.stable_only || file.stable_only.unwrap_or(false),
            dry_run: args.dry_run,
            exclude: if args.exclude.is_empty() {
                file.exclude
            } else {
                args.exclude.clone()
            },
            only: if args.only.is_empty() {
                file.only
            } else {
                args.only.clone()
            },
            urls,
            github_releases: args.github_releases || file.github_releases.unwrap_or(false),
            concurrency,
            per_host_concurrency,
            timeout: file.timeout.map(Duration::from_secs).unwrap_or(defaults.timeout),
        })
    }

    /// Filter built from the selection settings
    pub fn filter(&self) -> UpdateFilter {
        UpdateFilter::new()
            .with_kinds(self.kinds.clone())
            .with_exclude(self.exclude.clone())
            .with_only(self.only.clone())
    }

    /// Candidate selection options
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            stable_only: self.stable_only,
        }
    }

    /// Files to process: the explicit list, or every `.tf` file below `root`
    pub fn target_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        if !self.files.is_empty() {
            return Ok(self.files.clone());
        }
        find_terraform_files(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn args(argv: &[&str]) -> CliArgs {
        let mut full = vec!["tfau"];
        full.extend_from_slice(argv);
        CliArgs::parse_from(full)
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::merge(&args(&[]), FileConfig::default()).unwrap();
        assert_eq!(config.kinds, DeclarationKind::ALL.to_vec());
        assert_eq!(config.precision, VersionPrecision::Exact);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.per_host_concurrency, DEFAULT_PER_HOST_CONCURRENCY);
        assert_eq!(config.urls, BackendUrls::default());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(!config.stable_only);
    }

    #[test]
    fn test_parse_file_config() {
        let content = r#"
upgrades = ["modules", "providers"]
constraint = true
stable_only = true
exclude = ["legacy"]
registry_url = "https://registry.example.com"
concurrency = 2
per_host_concurrency = 1
timeout = 10
"#;
        let file = FileConfig::parse(content, Path::new("tfau.toml")).unwrap();
        let config = RunConfig::merge(&args(&[]), file).unwrap();
        assert_eq!(
            config.kinds,
            vec![DeclarationKind::Module, DeclarationKind::Provider]
        );
        assert_eq!(config.precision, VersionPrecision::Compatible);
        assert!(config.stable_only);
        assert_eq!(config.exclude, vec!["legacy"]);
        assert_eq!(config.urls.registry, "https://registry.example.com");
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.per_host_concurrency, 1);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            upgrades: Some(vec!["modules".to_string()]),
            exclude: vec!["legacy".to_string()],
            registry_url: Some("https://file.example.com".to_string()),
            concurrency: Some(2),
            ..FileConfig::default()
        };
        let config = RunConfig::merge(
            &args(&[
                "--upgrades",
                "providers",
                "--exclude",
                "aws",
                "--registry-url",
                "https://cli.example.com",
                "--concurrency",
                "16",
            ]),
            file,
        )
        .unwrap();
        assert_eq!(config.kinds, vec![DeclarationKind::Provider]);
        assert_eq!(config.exclude, vec!["aws"]);
        assert_eq!(config.urls.registry, "https://cli.example.com");
        assert_eq!(config.concurrency, 16);
    }

    #[test]
    fn test_invalid_upgrades() {
        let result = RunConfig::merge(&args(&["--upgrades", "modules,lambdas"]), FileConfig::default());
        assert!(matches!(result, Err(ConfigError::InvalidUpgradeKind { .. })));

        let result = RunConfig::merge(&args(&["--upgrades", " , "]), FileConfig::default());
        assert!(matches!(result, Err(ConfigError::EmptyUpgrades)));
    }

    #[test]
    fn test_terraform_version_requires_terraform_kind() {
        let result = RunConfig::merge(
            &args(&["--upgrades", "modules", "--terraform-version", "1.9.0"]),
            FileConfig::default(),
        );
        assert!(matches!(result, Err(ConfigError::ConflictingOptions { .. })));

        let config = RunConfig::merge(&args(&["--terraform-version", "1.9.0"]), FileConfig::default())
            .unwrap();
        assert_eq!(config.terraform_version.as_deref(), Some("1.9.0"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = FileConfig::parse("colour = true\n", Path::new("tfau.toml"));
        assert!(matches!(result, Err(ConfigError::InvalidConfigFile { .. })));
    }

    #[test]
    fn test_zero_per_host_rejected() {
        let file = FileConfig {
            per_host_concurrency: Some(0),
            ..FileConfig::default()
        };
        assert!(RunConfig::merge(&args(&[]), file).is_err());
    }

    #[test]
    fn test_discover_implicit_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "stable_only = true\n").unwrap();
        let path = dir.path().to_str().unwrap();

        let config = RunConfig::from_cli(&args(&[path])).unwrap();
        assert!(config.stable_only);
    }

    #[test]
    fn test_discover_explicit_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let result = RunConfig::from_cli(&args(&["--config", missing.to_str().unwrap()]));
        assert!(matches!(result, Err(ConfigError::InvalidConfigFile { .. })));
    }

    #[test]
    fn test_target_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.tf"), "").unwrap();
        let path = dir.path().to_str().unwrap();

        let config = RunConfig::merge(&args(&[path]), FileConfig::default()).unwrap();
        assert_eq!(config.target_files().unwrap(), vec![dir.path().join("main.tf")]);

        let config =
            RunConfig::merge(&args(&[path, "-f", "other.tf"]), FileConfig::default()).unwrap();
        assert_eq!(config.target_files().unwrap(), vec![PathBuf::from("other.tf")]);
    }
}
