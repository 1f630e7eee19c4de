//! Source address classification and normalization
//!
//! This module provides:
//! - `?ref=` marker extraction and `git@host:path` normalization for module sources
//! - Classification into registry, SSH-hosted, HTTPS-hosted or unsupported sources
//! - Registry module and provider address parsing (with namespace aliases)

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry namespaces that were renamed by their vendor: `(namespace, name, replacement)`
const NAMESPACE_ALIASES: &[(&str, &str, &str)] =
    &[("GoogleCloudPlatform", "sql-db", "terraform-google-modules")];

/// Hostname of the public Terraform Registry as it appears in provider sources
const PUBLIC_REGISTRY_HOST: &str = "registry.terraform.io";

/// Backend family a source address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// `namespace/name/provider` on a module registry
    Registry,
    /// `git@host:path` or `ssh://...`
    VcsSsh,
    /// `https://...`
    VcsHttps,
    /// Local paths, archives, buckets and anything else
    Unsupported,
}

impl SourceKind {
    /// Returns true for version-control hosted sources
    pub fn is_vcs(&self) -> bool {
        matches!(self, SourceKind::VcsSsh | SourceKind::VcsHttps)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Registry => "registry",
            SourceKind::VcsSsh => "vcs-ssh",
            SourceKind::VcsHttps => "vcs-https",
            SourceKind::Unsupported => "unsupported",
        };
        write!(f, "{}", name)
    }
}

/// A source address after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedSource {
    pub kind: SourceKind,
    /// Address without the `//subdir` suffix, query or a `git::` getter prefix
    pub address: String,
    /// Path after `//`, kept for display only
    pub submodule: Option<String>,
    /// Query string after `?` (e.g. `depth=1`), kept for display only
    pub query: Option<String>,
}

/// Classifies a module source address
///
/// The `?query` and the `//subdir` suffix are split off first, so lookups
/// never see them. The `//` that follows a URL scheme is not a subdirectory
/// separator.
pub fn classify_source(raw: &str) -> ClassifiedSource {
    let trimmed = raw.trim();
    let without_getter = trimmed.strip_prefix("git::").unwrap_or(trimmed);
    let (without_query, query) = match without_getter.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_getter, None),
    };
    let (address, submodule) = split_submodule(without_query);

    let kind = if address.starts_with("git@") || address.starts_with("ssh://") {
        SourceKind::VcsSsh
    } else if address.starts_with("https://") {
        SourceKind::VcsHttps
    } else if is_registry_address(address) {
        SourceKind::Registry
    } else {
        SourceKind::Unsupported
    };

    ClassifiedSource {
        kind,
        address: address.to_string(),
        submodule: submodule.map(str::to_string),
        query: query.map(str::to_string),
    }
}

fn split_submodule(source: &str) -> (&str, Option<&str>) {
    let search_from = source.find("://").map(|i| i + 3).unwrap_or(0);
    match source[search_from..].find("//") {
        Some(offset) => {
            let at = search_from + offset;
            (&source[..at], Some(&source[at + 2..]))
        }
        None => (source, None),
    }
}

/// `namespace/name/provider`; local paths (`./x/y`, `../a/b`, `/abs/p/q`) never match
fn is_registry_address(address: &str) -> bool {
    if address.starts_with('/') {
        return false;
    }
    let segments: Vec<&str> = address.split('/').collect();
    if segments.iter().any(|s| s.starts_with('.')) {
        return false;
    }
    segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}

/// Splits a `?ref=<value>` marker off a module source
///
/// Other query parameters stay on the source.
pub fn split_ref_marker(source: &str) -> (String, Option<String>) {
    let Some((base, query)) = source.split_once('?') else {
        return (source.to_string(), None);
    };

    let mut reference = None;
    let mut rest = Vec::new();
    for pair in query.split('&') {
        match pair.strip_prefix("ref=") {
            Some(value) if reference.is_none() => reference = Some(value.to_string()),
            _ => rest.push(pair),
        }
    }

    if reference.is_none() {
        return (source.to_string(), None);
    }
    let stripped = if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, rest.join("&"))
    };
    (stripped, reference)
}

/// Rewrites an scp-like `git@host:path` address to `ssh://host/path`
pub fn normalize_scp_like(source: &str) -> String {
    let (prefix, rest) = match source.strip_prefix("git::") {
        Some(rest) => ("git::", rest),
        None => ("", source),
    };
    match rest.strip_prefix("git@").and_then(|r| r.split_once(':')) {
        Some((host, path)) if !path.starts_with("//") => {
            format!("{}ssh://{}/{}", prefix, host, path.trim_start_matches('/'))
        }
        _ => source.to_string(),
    }
}

/// Host and repository path of a version-control address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    pub host: String,
    /// Path without leading `/` or trailing `.git`
    pub path: String,
}

impl ClassifiedSource {
    /// Returns the host and path for version-control sources
    pub fn remote(&self) -> Option<RemoteLocation> {
        if !self.kind.is_vcs() {
            return None;
        }
        let rest = if let Some(scp) = self.address.strip_prefix("git@") {
            scp.replacen(':', "/", 1)
        } else {
            let (_, after_scheme) = self.address.split_once("://")?;
            after_scheme.to_string()
        };
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit('@').next().unwrap_or(authority);
        let host = host.split(':').next().unwrap_or(host);
        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        if host.is_empty() || path.is_empty() {
            return None;
        }
        Some(RemoteLocation {
            host: host.to_string(),
            path: path.to_string(),
        })
    }

    /// Returns the URL handed to git for tag listing
    ///
    /// SSH addresses without a user get the conventional `git@` user.
    pub fn git_url(&self) -> String {
        match self.address.strip_prefix("ssh://") {
            Some(rest) if !rest.split('/').next().unwrap_or_default().contains('@') => {
                format!("ssh://git@{}", rest)
            }
            _ => self.address.clone(),
        }
    }

    /// Returns `(owner, repo)` for GitHub-hosted sources
    pub fn github_repository(&self) -> Option<(String, String)> {
        let remote = self.remote()?;
        if !remote.host.eq_ignore_ascii_case("github.com") {
            return None;
        }
        let mut segments = remote.path.split('/');
        let owner = segments.next().filter(|s| !s.is_empty())?;
        let repo = segments.next().filter(|s| !s.is_empty())?;
        Some((owner.to_string(), repo.to_string()))
    }
}

impl fmt::Display for ClassifiedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        if let Some(sub) = &self.submodule {
            write!(f, "//{}", sub)?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

/// `namespace/name/provider` on the module registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryModuleAddress {
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

impl RegistryModuleAddress {
    /// Parses a classified registry address, applying namespace aliases
    pub fn from_source(source: &ClassifiedSource) -> Result<Self, ResolveError> {
        if source.kind != SourceKind::Registry {
            return Err(ResolveError::unsupported(
                source.to_string(),
                format!("{} sources are not served by the module registry", source.kind),
            ));
        }
        let mut parts = source.address.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(name), Some(provider)) => {
                let namespace = NAMESPACE_ALIASES
                    .iter()
                    .find(|(ns, n, _)| *ns == namespace && *n == name)
                    .map(|(_, _, replacement)| *replacement)
                    .unwrap_or(namespace);
                Ok(Self {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    provider: provider.to_string(),
                })
            }
            _ => Err(ResolveError::unsupported(
                source.to_string(),
                "expected namespace/name/provider",
            )),
        }
    }
}

impl fmt::Display for RegistryModuleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.provider)
    }
}

/// `namespace/type` of a provider on the public registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAddress {
    pub namespace: String,
    pub name: String,
}

impl ProviderAddress {
    /// Parses `[registry.terraform.io/]namespace/type`
    pub fn parse(source: &str) -> Result<Self, ResolveError> {
        let segments: Vec<&str> = source.trim().split('/').collect();
        let (namespace, name) = match segments.as_slice() {
            [namespace, name] => (*namespace, *name),
            [host, namespace, name] if host.eq_ignore_ascii_case(PUBLIC_REGISTRY_HOST) => {
                (*namespace, *name)
            }
            [host, _, _] => {
                return Err(ResolveError::unsupported(
                    source,
                    format!("provider registry host '{}' is not supported", host),
                ))
            }
            _ => {
                return Err(ResolveError::unsupported(
                    source,
                    "expected [hostname/]namespace/type",
                ))
            }
        };
        if namespace.is_empty() || name.is_empty() {
            return Err(ResolveError::unsupported(source, "empty namespace or type"));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ProviderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
