//! CLI argument parsing module for tfau

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Parse a strictly positive concurrency limit
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", s))?;
    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    Ok(value)
}

/// Terraform module, provider and version updater
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tfau",
    version,
    about = "Upgrade Terraform modules, providers and required_version in place"
)]
pub struct CliArgs {
    /// Target directory searched recursively for .tf files (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Process only these files instead of searching PATH (can be specified multiple times)
    #[arg(short = 'f', long = "file", action = ArgAction::Append)]
    pub files: Vec<PathBuf>,

    // Selection
    /// Comma-separated declaration kinds to upgrade: modules, providers, terraform
    #[arg(short = 'u', long)]
    pub upgrades: Option<String>,

    /// Write this value to required_version instead of looking up the latest release
    #[arg(long, value_name = "CONSTRAINT")]
    pub terraform_version: Option<String>,

    /// Exclude declarations by name or source (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Update only declarations matching name or source (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    // Version policy
    /// Write `~> MAJOR.MINOR` constraints instead of exact versions
    #[arg(long)]
    pub constraint: bool,

    /// Ignore pre-release versions
    #[arg(long)]
    pub stable_only: bool,

    // General options
    /// Dry run mode - show what would be updated without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    // Backends
    /// Terraform Registry base URL
    #[arg(long, value_name = "URL")]
    pub registry_url: Option<String>,

    /// HashiCorp releases base URL
    #[arg(long, value_name = "URL")]
    pub releases_url: Option<String>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    pub github_api_url: Option<String>,

    /// Use GitHub releases instead of git tags for github.com module sources
    #[arg(long)]
    pub github_releases: bool,

    /// Maximum number of simultaneous version lookups
    #[arg(long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Config file (default: tfau.toml in PATH, if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Check if explicit files were given
    pub fn has_explicit_files(&self) -> bool {
        !self.files.is_empty()
    }
}
