//! Version backends for fetching candidate versions
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - Terraform Registry module and provider adapters
//! - HashiCorp releases index adapter (Terraform CLI versions)
//! - Git tag listing adapter (HTTPS and SSH)
//! - GitHub releases adapter with tag fallback
//! - Routing from a declaration to the backend that serves it

mod client;
mod git;
mod github;
mod releases;
mod terraform_registry;

pub use client::{HttpClient, DEFAULT_TIMEOUT};
pub use git::{parse_ls_remote, parse_ref_advertisement, GitTagsBackend};
pub use github::{GitHubReleasesBackend, DEFAULT_GITHUB_API_URL};
pub use releases::{TerraformReleasesBackend, DEFAULT_RELEASES_URL};
pub use terraform_registry::{RegistryModuleBackend, RegistryProviderBackend, DEFAULT_REGISTRY_URL};

use crate::domain::{
    classify_source, Declaration, DeclarationKind, ProviderAddress, RegistryModuleAddress,
    SourceKind,
};
use crate::error::{RegistryError, ResolveError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for version backends
#[async_trait]
pub trait VersionBackend: Send + Sync {
    /// Get the backend name used in messages
    fn backend_name(&self) -> &'static str;

    /// Host contacted for `target`, used for per-host concurrency limits
    fn host(&self, target: &str) -> String;

    /// Fetch raw candidate version strings for `target`
    async fn fetch_versions(&self, target: &str) -> Result<Vec<String>, RegistryError>;
}

/// Returns the host portion of a base URL
pub(crate) fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Base URLs for the HTTP backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrls {
    pub registry: String,
    pub releases: String,
    pub github_api: String,
}

impl Default for BackendUrls {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY_URL.to_string(),
            releases: DEFAULT_RELEASES_URL.to_string(),
            github_api: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

/// A backend together with the lookup target it expects
pub struct Route {
    pub backend: Arc<dyn VersionBackend>,
    pub target: String,
}

impl Route {
    /// Host this lookup will contact
    pub fn host(&self) -> String {
        self.backend.host(&self.target)
    }
}

/// The full set of backends, routed per declaration
pub struct BackendSet {
    modules: Arc<dyn VersionBackend>,
    providers: Arc<dyn VersionBackend>,
    releases: Arc<dyn VersionBackend>,
    git: Arc<dyn VersionBackend>,
    github: Option<Arc<dyn VersionBackend>>,
}

impl BackendSet {
    /// Create all backends sharing one HTTP client
    ///
    /// With `github_releases`, github.com sources use the GitHub API instead of git.
    pub fn new(
        client: HttpClient,
        urls: &BackendUrls,
        github_releases: bool,
        git_timeout: Duration,
    ) -> Self {
        let github: Option<Arc<dyn VersionBackend>> = if github_releases {
            Some(Arc::new(GitHubReleasesBackend::with_api_url(
                client.clone(),
                urls.github_api.clone(),
            )))
        } else {
            None
        };

        Self {
            modules: Arc::new(RegistryModuleBackend::with_base_url(
                client.clone(),
                urls.registry.clone(),
            )),
            providers: Arc::new(RegistryProviderBackend::with_base_url(
                client.clone(),
                urls.registry.clone(),
            )),
            releases: Arc::new(TerraformReleasesBackend::with_base_url(
                client.clone(),
                urls.releases.clone(),
            )),
            git: Arc::new(GitTagsBackend::new(client, git_timeout)),
            github,
        }
    }

    /// Pick the backend and lookup target for a declaration
    pub fn route(&self, declaration: &Declaration) -> Result<Route, ResolveError> {
        match declaration.kind {
            DeclarationKind::Module => {
                let raw = declaration.source.as_deref().unwrap_or_default();
                let source = classify_source(raw);
                match source.kind {
                    SourceKind::Registry => {
                        let address = RegistryModuleAddress::from_source(&source)?;
                        Ok(Route {
                            backend: Arc::clone(&self.modules),
                            target: address.to_string(),
                        })
                    }
                    SourceKind::VcsSsh | SourceKind::VcsHttps => {
                        match (&self.github, source.github_repository()) {
                            (Some(github), Some(_)) => Ok(Route {
                                backend: Arc::clone(github),
                                target: source.address.clone(),
                            }),
                            _ => Ok(Route {
                                backend: Arc::clone(&self.git),
                                target: source.git_url(),
                            }),
                        }
                    }
                    SourceKind::Unsupported => Err(ResolveError::unsupported(
                        raw,
                        "not a registry address or git remote",
                    )),
                }
            }
            DeclarationKind::Provider => {
                let raw = declaration.source.as_deref().unwrap_or_default();
                let address = ProviderAddress::parse(raw)?;
                Ok(Route {
                    backend: Arc::clone(&self.providers),
                    target: address.to_string(),
                })
            }
            DeclarationKind::Terraform => Ok(Route {
                backend: Arc::clone(&self.releases),
                target: "terraform".to_string(),
            }),
        }
    }
}
