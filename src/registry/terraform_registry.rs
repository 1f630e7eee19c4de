//! Terraform Registry adapters
//!
//! Fetches module and provider versions from the registry protocol endpoints:
//! - Modules: {base}/v1/modules/{namespace}/{name}/{provider}/versions
//! - Providers: {base}/v1/providers/{namespace}/{type}/versions

use crate::error::RegistryError;
use crate::registry::{host_of, HttpClient, VersionBackend};
use async_trait::async_trait;
use serde::Deserialize;

/// Public Terraform Registry base URL
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.terraform.io";

/// Module versions response
#[derive(Debug, Deserialize)]
struct ModuleVersionsResponse {
    modules: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
struct ModuleEntry {
    versions: Vec<VersionEntry>,
}

/// Provider versions response
#[derive(Debug, Deserialize)]
struct ProviderVersionsResponse {
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    version: String,
}

/// Module registry adapter; `target` is `namespace/name/provider`
pub struct RegistryModuleBackend {
    client: HttpClient,
    base_url: String,
}

impl RegistryModuleBackend {
    /// Create an adapter for the public registry
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, DEFAULT_REGISTRY_URL)
    }

    /// Create an adapter for a registry at a custom base URL
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build the versions URL for a module address
    fn build_url(&self, address: &str) -> String {
        format!("{}/v1/modules/{}/versions", self.base_url, address)
    }
}

#[async_trait]
impl VersionBackend for RegistryModuleBackend {
    fn backend_name(&self) -> &'static str {
        "Terraform Registry"
    }

    fn host(&self, _target: &str) -> String {
        host_of(&self.base_url)
    }

    async fn fetch_versions(&self, address: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.build_url(address);
        tracing::debug!(%url, "fetching module versions");
        let response: ModuleVersionsResponse = self
            .client
            .get_json(&url, address, self.backend_name())
            .await?;

        Ok(response
            .modules
            .into_iter()
            .flat_map(|m| m.versions)
            .map(|v| v.version)
            .collect())
    }
}

/// Provider registry adapter; `target` is `namespace/type`
pub struct RegistryProviderBackend {
    client: HttpClient,
    base_url: String,
}

impl RegistryProviderBackend {
    /// Create an adapter for the public registry
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, DEFAULT_REGISTRY_URL)
    }

    /// Create an adapter for a registry at a custom base URL
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build the versions URL for a provider address
    fn build_url(&self, address: &str) -> String {
        format!("{}/v1/providers/{}/versions", self.base_url, address)
    }
}

#[async_trait]
impl VersionBackend for RegistryProviderBackend {
    fn backend_name(&self) -> &'static str {
        "Terraform Registry"
    }

    fn host(&self, _target: &str) -> String {
        host_of(&self.base_url)
    }

    async fn fetch_versions(&self, address: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.build_url(address);
        tracing::debug!(%url, "fetching provider versions");
        let response: ProviderVersionsResponse = self
            .client
            .get_json(&url, address, self.backend_name())
            .await?;

        Ok(response.versions.into_iter().map(|v| v.version).collect())
    }
}
