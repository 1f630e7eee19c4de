//! Git tag listing without cloning
//!
//! - HTTPS remotes: the smart-HTTP reference advertisement
//!   (`GET <repo>/info/refs?service=git-upload-pack`), parsed as pkt-lines
//! - SSH remotes: `git ls-remote --tags --refs <url>`
//!
//! Only `refs/tags/*` names are returned; peeled `^{}` entries are folded into their tag.

use crate::domain::classify_source;
use crate::error::RegistryError;
use crate::registry::{HttpClient, VersionBackend};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

const TAG_PREFIX: &str = "refs/tags/";
const PEELED_SUFFIX: &str = "^{}";

/// Git tag adapter; `target` is the remote URL
pub struct GitTagsBackend {
    client: HttpClient,
    timeout: Duration,
}

impl GitTagsBackend {
    /// Create a git adapter; `timeout` bounds each `git ls-remote` run
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Build the reference advertisement URL for an HTTPS remote
    fn info_refs_url(url: &str) -> String {
        format!(
            "{}/info/refs?service=git-upload-pack",
            url.trim_end_matches('/')
        )
    }

    async fn fetch_https(&self, url: &str) -> Result<Vec<String>, RegistryError> {
        let body = self
            .client
            .get_bytes(&Self::info_refs_url(url), url, self.backend_name())
            .await?;
        parse_ref_advertisement(&body)
            .map_err(|message| RegistryError::invalid_response(url, self.backend_name(), message))
    }

    async fn fetch_ssh(&self, url: &str) -> Result<Vec<String>, RegistryError> {
        let run = Command::new("git")
            .args(["ls-remote", "--tags", "--refs", url])
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| RegistryError::timeout(url, self.backend_name()))?
            .map_err(|e| RegistryError::git_error(url, format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RegistryError::git_error(
                url,
                format!("git ls-remote failed: {}", stderr.trim()),
            ));
        }

        Ok(parse_ls_remote(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl VersionBackend for GitTagsBackend {
    fn backend_name(&self) -> &'static str {
        "git"
    }

    fn host(&self, url: &str) -> String {
        classify_source(url)
            .remote()
            .map(|r| r.host)
            .unwrap_or_else(|| url.to_string())
    }

    async fn fetch_versions(&self, url: &str) -> Result<Vec<String>, RegistryError> {
        tracing::debug!(url, "listing remote tags");
        if url.starts_with("https://") || url.starts_with("http://") {
            self.fetch_https(url).await
        } else {
            self.fetch_ssh(url).await
        }
    }
}

fn push_tag(tags: &mut Vec<String>, refname: &str) {
    if let Some(tag) = refname.strip_prefix(TAG_PREFIX) {
        let tag = tag.strip_suffix(PEELED_SUFFIX).unwrap_or(tag);
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
}

/// Parses `git ls-remote` output (`<oid>\t<ref>` per line)
pub fn parse_ls_remote(stdout: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for line in stdout.lines() {
        if let Some((_, refname)) = line.split_once('\t') {
            push_tag(&mut tags, refname.trim());
        }
    }
    tags
}

/// Parses a smart-HTTP `git-upload-pack` reference advertisement
///
/// Framing follows the pkt-line format in Git's `gitprotocol-common(5)`; the
/// advertisement layout is in `gitprotocol-http(5)` and `gitprotocol-pack(5)`:
/// - each pkt-line starts with 4 hex digits giving the total length, header included
/// - `0000` (flush), `0001` (delim) and `0002` (response-end) have no payload
/// - payloads usually end in LF; the first is the `# service=git-upload-pack` line
/// - ref lines are `<oid> SP <refname>`, the first one followed by NUL and capabilities
pub fn parse_ref_advertisement(body: &[u8]) -> Result<Vec<String>, String> {
    let mut tags = Vec::new();
    let mut pos = 0;

    while pos < body.len() {
        let header = body
            .get(pos..pos + 4)
            .ok_or_else(|| "truncated pkt-line header".to_string())?;
        let header =
            std::str::from_utf8(header).map_err(|_| "pkt-line header is not ASCII".to_string())?;
        let len = usize::from_str_radix(header, 16)
            .map_err(|_| format!("invalid pkt-line length '{}'", header))?;

        // flush-pkt and protocol v2 delimiters carry no payload
        if len < 4 {
            pos += 4;
            continue;
        }

        let payload = body
            .get(pos + 4..pos + len)
            .ok_or_else(|| "truncated pkt-line payload".to_string())?;
        pos += len;

        let line = String::from_utf8_lossy(payload);
        let line = line.trim_end_matches('\n');
        if line.starts_with('#') {
            continue;
        }
        // capabilities follow the first ref after a NUL byte
        let line = line.split('\0').next().unwrap_or_default();
        if let Some((_, refname)) = line.split_once(' ') {
            push_tag(&mut tags, refname);
        }
    }

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkt(line: &str) -> String {
        format!("{:04x}{}", line.len() + 4, line)
    }

    fn advertisement(refs: &[&str]) -> Vec<u8> {
        let mut body = pkt("# service=git-upload-pack\n");
        body.push_str("0000");
        for (i, refname) in refs.iter().enumerate() {
            let oid = "a".repeat(40);
            if i == 0 {
                body.push_str(&pkt(&format!("{oid} {refname}\0multi_ack side-band-64k\n")));
            } else {
                body.push_str(&pkt(&format!("{oid} {refname}\n")));
            }
        }
        body.push_str("0000");
        body.into_bytes()
    }

    #[test]
    fn test_parse_ref_advertisement() {
        let body = advertisement(&[
            "HEAD",
            "refs/heads/main",
            "refs/tags/v1.0.0",
            "refs/tags/v1.0.0^{}",
            "refs/tags/v1.1.0",
        ]);
        let tags = parse_ref_advertisement(&body).unwrap();
        assert_eq!(tags, vec!["v1.0.0", "v1.1.0"]);
    }

    #[test]
    fn test_parse_ref_advertisement_first_ref_is_tag() {
        let body = advertisement(&["refs/tags/0.1.0"]);
        assert_eq!(parse_ref_advertisement(&body).unwrap(), vec!["0.1.0"]);
    }

    #[test]
    fn test_parse_ref_advertisement_rejects_html() {
        assert!(parse_ref_advertisement(b"<html>login</html>").is_err());
    }

    #[test]
    fn test_parse_ref_advertisement_truncated() {
        assert!(parse_ref_advertisement(b"00ffabc").is_err());
    }

    #[test]
    fn test_parse_ref_advertisement_skips_special_packets() {
        let oid = "b".repeat(40);
        let body = format!(
            "0001{}0002{}0000",
            pkt(&format!("{oid} refs/tags/v2.0.0\n")),
            pkt(&format!("{oid} refs/tags/v2.1.0"))
        );
        assert_eq!(
            parse_ref_advertisement(body.as_bytes()).unwrap(),
            vec!["v2.0.0", "v2.1.0"]
        );
    }

    #[test]
    fn test_parse_ls_remote() {
        let stdout = "1111\trefs/tags/v0.1.0\n2222\trefs/tags/v0.2.0\n3333\trefs/heads/main\n";
        assert_eq!(parse_ls_remote(stdout), vec!["v0.1.0", "v0.2.0"]);
    }

    #[test]
    fn test_info_refs_url() {
        assert_eq!(
            GitTagsBackend::info_refs_url("https://example.com/org/repo.git/"),
            "https://example.com/org/repo.git/info/refs?service=git-upload-pack"
        );
    }

    #[test]
    fn test_host() {
        let backend = GitTagsBackend::new(HttpClient::new().unwrap(), Duration::from_secs(5));
        assert_eq!(
            backend.host("ssh://git@example.com/org/repo.git"),
            "example.com"
        );
    }

    #[tokio::test]
    async fn test_fetch_https_tags() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/org/repo.git/info/refs")
            .match_query(mockito::Matcher::UrlEncoded(
                "service".into(),
                "git-upload-pack".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/x-git-upload-pack-advertisement")
            .with_body(advertisement(&["refs/tags/v2.0.0", "refs/tags/v2.1.0"]))
            .create_async()
            .await;

        let backend = GitTagsBackend::new(HttpClient::new().unwrap(), Duration::from_secs(5));
        let tags = backend
            .fetch_versions(&format!("{}/org/repo.git", server.url()))
            .await
            .unwrap();
        assert_eq!(tags, vec!["v2.0.0", "v2.1.0"]);
        mock.assert_async().await;
    }
}
