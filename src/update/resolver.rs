//! Version resolution over raw backend candidates
//!
//! Candidates come from registries, release indexes and git tags, so their
//! naming is heterogeneous (`v1.2.3`, `1.2`, `release-7`). Anything that does
//! not read as a semantic version is dropped with a debug log, never an error.

use crate::error::ResolveError;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw candidate string together with its parsed ordering key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCandidate {
    /// String exactly as the backend reported it
    pub raw: String,
    /// Parsed semantic version
    pub version: Version,
}

impl VersionCandidate {
    /// Parses a candidate, tolerating a `v` prefix and partial versions
    ///
    /// - "v1.2.3" -> 1.2.3
    /// - "1.2" -> 1.2.0
    /// - "2" -> 2.0.0
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let unprefixed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if unprefixed.is_empty() {
            return None;
        }

        let parts: Vec<&str> = unprefixed.split('.').collect();
        let normalized = match parts.len() {
            1 => format!("{}.0.0", parts[0]),
            2 => format!("{}.{}.0", parts[0], parts[1]),
            _ => unprefixed.to_string(),
        };

        Version::parse(&normalized).ok().map(|version| Self {
            raw: trimmed.to_string(),
            version,
        })
    }

    /// Returns true if the version carries a pre-release tag
    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    /// Renders the value to write for the requested precision
    pub fn render(&self, precision: VersionPrecision) -> String {
        match precision {
            VersionPrecision::Exact => self.raw.clone(),
            VersionPrecision::Compatible => {
                format!("~> {}.{}", self.version.major, self.version.minor)
            }
        }
    }
}

impl Ord for VersionCandidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.version.cmp(&other.version)
    }
}

impl PartialOrd for VersionCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// How a resolved version is written back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPrecision {
    /// The exact release string, e.g. `5.31.0`
    #[default]
    Exact,
    /// A pessimistic constraint on major.minor, e.g. `~> 5.31`
    Compatible,
}

/// Candidate selection options
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Drop pre-releases before selecting
    pub stable_only: bool,
}

/// Picks the highest semantic version among raw candidates
///
/// `target` only labels logs and errors.
pub fn resolve_latest<I, S>(
    target: &str,
    candidates: I,
    options: ResolveOptions,
) -> Result<VersionCandidate, ResolveError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = Vec::new();
    for raw in candidates {
        let raw = raw.as_ref();
        match VersionCandidate::parse(raw) {
            Some(candidate) if options.stable_only && candidate.is_prerelease() => {
                tracing::debug!(target_name = target, candidate = raw, "skipping pre-release");
            }
            Some(candidate) => parsed.push(candidate),
            None => {
                tracing::debug!(target_name = target, candidate = raw, "skipping invalid version");
            }
        }
    }

    // Equal versions (`v1.0.0` and `1.0.0`) fall back to the raw string so the
    // result never depends on listing order
    let latest = parsed
        .into_iter()
        .max_by(|a, b| a.version.cmp(&b.version).then_with(|| a.raw.cmp(&b.raw)))
        .ok_or_else(|| ResolveError::no_versions(target))?;
    tracing::debug!(target_name = target, latest = %latest, "resolved latest version");
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", 1, 2, 3)]
    #[case("v1.2.3", 1, 2, 3)]
    #[case("V4.0.1", 4, 0, 1)]
    #[case("1.2", 1, 2, 0)]
    #[case("7", 7, 0, 0)]
    #[case(" 0.15.0 ", 0, 15, 0)]
    fn test_parse_candidate(
        #[case] raw: &str,
        #[case] major: u64,
        #[case] minor: u64,
        #[case] patch: u64,
    ) {
        let candidate = VersionCandidate::parse(raw).unwrap();
        assert_eq!(candidate.version, Version::new(major, minor, patch));
    }

    #[rstest]
    #[case("")]
    #[case("v")]
    #[case("latest")]
    #[case("release-1.0")]
    #[case("1.2.3.4")]
    #[case("main")]
    fn test_parse_candidate_invalid(#[case] raw: &str) {
        assert!(VersionCandidate::parse(raw).is_none());
    }

    #[test]
    fn test_parse_keeps_raw_tag() {
        let candidate = VersionCandidate::parse("v2.0.0").unwrap();
        assert_eq!(candidate.raw, "v2.0.0");
        assert_eq!(candidate.to_string(), "v2.0.0");
    }

    #[test]
    fn test_resolve_uses_semver_order_not_lexicographic() {
        let latest =
            resolve_latest("m", ["1.9.0", "1.10.0", "1.2.0"], ResolveOptions::default()).unwrap();
        assert_eq!(latest.raw, "1.10.0");
    }

    #[test]
    fn test_resolve_release_outranks_prerelease() {
        let latest = resolve_latest(
            "m",
            ["2.0.0-rc.1", "2.0.0", "2.0.0-beta"],
            ResolveOptions::default(),
        )
        .unwrap();
        assert_eq!(latest.raw, "2.0.0");
    }

    #[test]
    fn test_resolve_prerelease_can_win() {
        let latest =
            resolve_latest("m", ["1.5.0", "2.0.0-alpha.1"], ResolveOptions::default()).unwrap();
        assert_eq!(latest.raw, "2.0.0-alpha.1");
    }

    #[test]
    fn test_resolve_stable_only_drops_prereleases() {
        let options = ResolveOptions { stable_only: true };
        let latest = resolve_latest("m", ["1.5.0", "2.0.0-alpha.1"], options).unwrap();
        assert_eq!(latest.raw, "1.5.0");
    }

    #[test]
    fn test_resolve_skips_invalid_candidates() {
        let latest = resolve_latest(
            "repo",
            ["nightly", "v0.3.0", "v0.12.1", "wip-branch"],
            ResolveOptions::default(),
        )
        .unwrap();
        assert_eq!(latest.raw, "v0.12.1");
    }

    #[rstest]
    #[case(["v1.0.0", "1.0.0"])]
    #[case(["1.0.0", "v1.0.0"])]
    fn test_resolve_equal_versions_ignores_listing_order(#[case] candidates: [&str; 2]) {
        let latest = resolve_latest("m", candidates, ResolveOptions::default()).unwrap();
        assert_eq!(latest.raw, "v1.0.0");
    }

    #[test]
    fn test_resolve_empty_list() {
        let empty: [&str; 0] = [];
        let err = resolve_latest("m", empty, ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, ResolveError::NoVersionsFound { .. }));
    }

    #[test]
    fn test_resolve_all_invalid() {
        let err = resolve_latest("m", ["main", "dev"], ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, ResolveError::NoVersionsFound { .. }));
    }

    #[test]
    fn test_render_exact() {
        let candidate = VersionCandidate::parse("4.2.7").unwrap();
        assert_eq!(candidate.render(VersionPrecision::Exact), "4.2.7");
    }

    #[test]
    fn test_render_compatible() {
        let candidate = VersionCandidate::parse("v4.2.7").unwrap();
        assert_eq!(candidate.render(VersionPrecision::Compatible), "~> 4.2");
    }

    #[test]
    fn test_precision_default() {
        assert_eq!(VersionPrecision::default(), VersionPrecision::Exact);
    }
}
