//! GitHub releases adapter
//!
//! Fetches the latest release tag of a GitHub-hosted module, falling back
//! to the tag list when the repository publishes no releases.
//! - GET {api}/repos/{owner}/{repo}/releases/latest  (`tag_name`)
//! - GET {api}/repos/{owner}/{repo}/tags             (`[{name}]`)

use crate::domain::classify_source;
use crate::error::RegistryError;
use crate::registry::{host_of, HttpClient, VersionBackend};
use async_trait::async_trait;
use serde::Deserialize;

/// GitHub REST API base URL
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// GitHub adapter; `target` is a module source address on github.com
pub struct GitHubReleasesBackend {
    client: HttpClient,
    api_url: String,
}

impl GitHubReleasesBackend {
    /// Create an adapter for api.github.com
    pub fn new(client: HttpClient) -> Self {
        Self::with_api_url(client, DEFAULT_GITHUB_API_URL)
    }

    /// Create an adapter for a custom API base URL
    pub fn with_api_url(client: HttpClient, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Extract `owner/repo` from a source address
    fn repository(&self, source: &str) -> Result<(String, String), RegistryError> {
        classify_source(source).github_repository().ok_or_else(|| {
            RegistryError::invalid_response(
                source,
                self.backend_name(),
                "not a github.com repository address",
            )
        })
    }
}

#[async_trait]
impl VersionBackend for GitHubReleasesBackend {
    fn backend_name(&self) -> &'static str {
        "GitHub"
    }

    fn host(&self, _target: &str) -> String {
        host_of(&self.api_url)
    }

    async fn fetch_versions(&self, source: &str) -> Result<Vec<String>, RegistryError> {
        let (owner, repo) = self.repository(source)?;
        let slug = format!("{}/{}", owner, repo);

        let latest_url = format!("{}/repos/{}/releases/latest", self.api_url, slug);
        match self
            .client
            .get_json::<LatestRelease>(&latest_url, &slug, self.backend_name())
            .await
        {
            Ok(release) => return Ok(vec![release.tag_name]),
            Err(RegistryError::NotFound { .. }) => {
                tracing::debug!(repository = %slug, "no releases published, listing tags");
            }
            Err(e) => return Err(e),
        }

        let tags_url = format!("{}/repos/{}/tags?per_page=100", self.api_url, slug);
        let tags: Vec<Tag> = self
            .client
            .get_json(&tags_url, &slug, self.backend_name())
            .await?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }
}
