//! Terraform releases index adapter
//!
//! Fetches Terraform CLI versions from the HashiCorp releases index.
//! API endpoint: https://releases.hashicorp.com/terraform/index.json

use crate::error::RegistryError;
use crate::registry::{host_of, HttpClient, VersionBackend};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// HashiCorp releases base URL
pub const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com";

/// Releases index response; keys are version strings
#[derive(Debug, Deserialize)]
struct ReleasesIndex {
    versions: HashMap<String, ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    version: String,
}

/// Terraform releases adapter; `target` is the product name (`terraform`)
pub struct TerraformReleasesBackend {
    client: HttpClient,
    base_url: String,
}

impl TerraformReleasesBackend {
    /// Create an adapter for releases.hashicorp.com
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, DEFAULT_RELEASES_URL)
    }

    /// Create an adapter for a mirror at a custom base URL
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_url(&self, product: &str) -> String {
        format!("{}/{}/index.json", self.base_url, product)
    }
}

#[async_trait]
impl VersionBackend for TerraformReleasesBackend {
    fn backend_name(&self) -> &'static str {
        "HashiCorp releases"
    }

    fn host(&self, _target: &str) -> String {
        host_of(&self.base_url)
    }

    async fn fetch_versions(&self, product: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.build_url(product);
        tracing::debug!(%url, "fetching release index");
        let index: ReleasesIndex = self
            .client
            .get_json(&url, product, self.backend_name())
            .await?;

        Ok(index.versions.into_values().map(|r| r.version).collect())
    }
}
