//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: reading, parsing, rewriting and writing `.tf` files
//! - RegistryError: failures talking to a version backend (registry, releases, git, GitHub)
//! - ResolveError: per-declaration resolution failures
//! - ConfigError: invalid CLI or `tfau.toml` configuration

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Terraform file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Version resolution errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to Terraform file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read the file
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid HCL
    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// A value span could not be located while rewriting
    #[error("failed to rewrite {path}: {message}")]
    RewriteError { path: PathBuf, message: String },

    /// Failed to write the file
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by version backends
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The module, provider or repository does not exist
    #[error("'{target}' not found in {backend}")]
    NotFound { target: String, backend: String },

    /// Non-success HTTP status that is not retried
    #[error("{backend} returned HTTP {status} for '{target}'")]
    HttpStatus {
        target: String,
        backend: String,
        status: u16,
    },

    /// Network request failed
    #[error("failed to fetch '{target}' from {backend}: {message}")]
    NetworkError {
        target: String,
        backend: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {backend}")]
    RateLimitExceeded { backend: String },

    /// Response body did not match the expected shape
    #[error("invalid response from {backend} for '{target}': {message}")]
    InvalidResponse {
        target: String,
        backend: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{target}' from {backend}")]
    Timeout { target: String, backend: String },

    /// `git ls-remote` failed or could not be spawned
    #[error("git failed for '{target}': {message}")]
    GitError { target: String, message: String },
}

/// Errors resolving a single declaration to its newest version
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No backend can serve this source
    #[error("unsupported source '{source_address}': {reason}")]
    UnsupportedSource {
        source_address: String,
        reason: String,
    },

    /// Every candidate was rejected (or the backend returned none)
    #[error("no versions found for '{target}'")]
    NoVersionsFound { target: String },

    /// Backend failure
    #[error(transparent)]
    Backend(#[from] RegistryError),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown entry in the upgrades list
    #[error("unknown upgrade type '{value}': expected 'modules', 'providers' or 'terraform'")]
    InvalidUpgradeKind { value: String },

    /// Upgrades list resolved to nothing
    #[error("at least one upgrade type must be specified")]
    EmptyUpgrades,

    /// Failed to read or parse the config file
    #[error("invalid config file {path}: {message}")]
    InvalidConfigFile { path: PathBuf, message: String },

    /// Invalid path
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: PathBuf, message: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

impl ManifestError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new ParseError
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new RewriteError
    pub fn rewrite_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::RewriteError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Attaches a path to an error produced without one
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match self {
            ManifestError::ReadError { source, .. } => ManifestError::ReadError { path, source },
            ManifestError::ParseError { message, .. } => {
                ManifestError::ParseError { path, message }
            }
            ManifestError::RewriteError { message, .. } => {
                ManifestError::RewriteError { path, message }
            }
            ManifestError::WriteError { source, .. } => ManifestError::WriteError { path, source },
        }
    }
}

impl RegistryError {
    /// Creates a new NotFound error
    pub fn not_found(target: impl Into<String>, backend: impl Into<String>) -> Self {
        RegistryError::NotFound {
            target: target.into(),
            backend: backend.into(),
        }
    }

    /// Creates a new HttpStatus error
    pub fn http_status(target: impl Into<String>, backend: impl Into<String>, status: u16) -> Self {
        RegistryError::HttpStatus {
            target: target.into(),
            backend: backend.into(),
            status,
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        target: impl Into<String>,
        backend: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            target: target.into(),
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(backend: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            backend: backend.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        target: impl Into<String>,
        backend: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            target: target.into(),
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(target: impl Into<String>, backend: impl Into<String>) -> Self {
        RegistryError::Timeout {
            target: target.into(),
            backend: backend.into(),
        }
    }

    /// Creates a new GitError
    pub fn git_error(target: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::GitError {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Returns true when a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::NetworkError { .. }
            | RegistryError::Timeout { .. }
            | RegistryError::RateLimitExceeded { .. } => true,
            RegistryError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl ResolveError {
    /// Creates a new UnsupportedSource error
    pub fn unsupported(source_address: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::UnsupportedSource {
            source_address: source_address.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new NoVersionsFound error
    pub fn no_versions(target: impl Into<String>) -> Self {
        ResolveError::NoVersionsFound {
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_parse() {
        let err = ManifestError::parse_error("/infra/main.tf", "expected `}`");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse"));
        assert!(msg.contains("main.tf"));
        assert!(msg.contains("expected `}`"));
    }

    #[test]
    fn test_manifest_error_write() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = ManifestError::write_error("/infra/main.tf", io);
        let msg = format!("{}", err);
        assert!(msg.contains("failed to write"));
        assert!(msg.contains("read-only"));
    }

    #[test]
    fn test_manifest_error_with_path() {
        let err = ManifestError::parse_error("", "bad token").with_path("/infra/vpc.tf");
        match err {
            ManifestError::ParseError { path, message } => {
                assert_eq!(path, PathBuf::from("/infra/vpc.tf"));
                assert_eq!(message, "bad token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_registry_error_not_found() {
        let err = RegistryError::not_found("hashicorp/nope", "Terraform Registry");
        let msg = format!("{}", err);
        assert!(msg.contains("'hashicorp/nope' not found"));
        assert!(msg.contains("Terraform Registry"));
    }

    #[test]
    fn test_registry_error_http_status() {
        let err = RegistryError::http_status("org/repo", "GitHub", 503);
        assert!(format!("{}", err).contains("HTTP 503"));
    }

    #[test]
    fn test_registry_error_git() {
        let err = RegistryError::git_error("ssh://example.com/org/repo.git", "exit status 128");
        let msg = format!("{}", err);
        assert!(msg.contains("git failed"));
        assert!(msg.contains("exit status 128"));
    }

    #[test]
    fn test_registry_error_is_transient() {
        assert!(RegistryError::timeout("a", "b").is_transient());
        assert!(RegistryError::network_error("a", "b", "reset").is_transient());
        assert!(RegistryError::http_status("a", "b", 502).is_transient());
        assert!(!RegistryError::http_status("a", "b", 403).is_transient());
        assert!(!RegistryError::not_found("a", "b").is_transient());
        assert!(!RegistryError::invalid_response("a", "b", "eof").is_transient());
    }

    #[test]
    fn test_resolve_error_unsupported() {
        let err = ResolveError::unsupported("./modules/vpc", "local path");
        let msg = format!("{}", err);
        assert!(msg.contains("unsupported source './modules/vpc'"));
        assert!(msg.contains("local path"));
    }

    #[test]
    fn test_resolve_error_no_versions() {
        let err = ResolveError::no_versions("terraform-aws-modules/vpc/aws");
        assert!(format!("{}", err).contains("no versions found"));
    }

    #[test]
    fn test_resolve_error_from_registry_error() {
        let err: ResolveError = RegistryError::timeout("hashicorp/aws", "Terraform Registry").into();
        assert!(matches!(err, ResolveError::Backend(_)));
        assert!(format!("{}", err).contains("timeout"));
    }

    #[test]
    fn test_config_error_invalid_upgrade_kind() {
        let err = ConfigError::InvalidUpgradeKind {
            value: "packages".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("unknown upgrade type"));
        assert!(msg.contains("packages"));
    }

    #[test]
    fn test_app_error_from_manifest_error() {
        let app_err: AppError = ManifestError::parse_error("/a.tf", "oops").into();
        assert!(format!("{}", app_err).contains("failed to parse"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::EmptyUpgrades.into();
        assert!(format!("{}", app_err).contains("at least one upgrade type"));
    }
}
