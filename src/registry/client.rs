//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - A bounded redirect count
//! - Exponential backoff retry for connection errors, timeouts, 429 and 5xx
//! - No retry for other 4xx responses or undecodable bodies

use crate::error::RegistryError;
use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("tfau/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| {
                RegistryError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        })
    }

    /// Create a client with the given timeout and the default User-Agent
    pub fn with_timeout(timeout: Duration) -> Result<Self, RegistryError> {
        Self::with_config(timeout, DEFAULT_USER_AGENT)
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial backoff delay
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Perform a GET request with retry logic and error context
    ///
    /// `target` names what is being looked up and `backend` the service, both for errors.
    pub async fn get_with_context(
        &self,
        url: &str,
        target: &str,
        backend: &str,
    ) -> Result<reqwest::Response, RegistryError> {
        let mut delay = self.base_delay;
        let mut attempt = 0;

        loop {
            let error = match self.client.get(url).send().await {
                Ok(response) => match Self::check_status(response, target, backend) {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                },
                Err(e) if e.is_timeout() => RegistryError::timeout(target, backend),
                Err(e) if e.is_redirect() => {
                    return Err(RegistryError::network_error(
                        target,
                        backend,
                        format!("too many redirects (limit {})", MAX_REDIRECTS),
                    ))
                }
                Err(e) => RegistryError::network_error(target, backend, e.to_string()),
            };

            if !error.is_transient() || attempt >= self.max_retries {
                return Err(error);
            }

            attempt += 1;
            tracing::debug!(url, attempt, error = %error, "retrying request");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }

    fn check_status(
        response: reqwest::Response,
        target: &str,
        backend: &str,
    ) -> Result<reqwest::Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => RegistryError::rate_limit_exceeded(backend),
            StatusCode::NOT_FOUND => RegistryError::not_found(target, backend),
            _ => RegistryError::http_status(target, backend, status.as_u16()),
        })
    }

    /// Perform a GET request and parse a JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        target: &str,
        backend: &str,
    ) -> Result<T, RegistryError> {
        let response = self.get_with_context(url, target, backend).await?;
        response.json::<T>().await.map_err(|e| {
            RegistryError::invalid_response(target, backend, format!("failed to parse JSON: {}", e))
        })
    }

    /// Perform a GET request and return the body as bytes
    pub async fn get_bytes(
        &self,
        url: &str,
        target: &str,
        backend: &str,
    ) -> Result<Vec<u8>, RegistryError> {
        let response = self.get_with_context(url, target, backend).await?;
        response.bytes().await.map(|b| b.to_vec()).map_err(|e| {
            RegistryError::invalid_response(
                target,
                backend,
                format!("failed to read response body: {}", e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        ok: bool,
    }

    fn fast_client() -> HttpClient {
        HttpClient::new()
            .unwrap()
            .with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_http_client_creation() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_http_client_with_config() {
        let client = HttpClient::with_config(Duration::from_secs(60), "test-agent/1.0");
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_client_with_max_retries() {
        let client = HttpClient::new().unwrap().with_max_retries(5);
        assert_eq!(client.max_retries, 5);
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert!(DEFAULT_USER_AGENT.starts_with("tfau/"));
        assert_eq!(MAX_RETRIES, 3);
        assert_eq!(MAX_REDIRECTS, 10);
        assert_eq!(BASE_DELAY_MS, 100);
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let payload: Payload = fast_client()
            .get_json(&format!("{}/ok", server.url()), "x", "test")
            .await
            .unwrap();
        assert!(payload.ok);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let err = fast_client()
            .get_with_context(&format!("{}/missing", server.url()), "x", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/forbidden")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let err = fast_client()
            .get_with_context(&format!("{}/forbidden", server.url()), "x", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::HttpStatus { status: 403, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(4)
            .create_async()
            .await;

        let err = fast_client()
            .get_with_context(&format!("{}/flaky", server.url()), "x", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::HttpStatus { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_body("<html>")
            .expect(1)
            .create_async()
            .await;

        let err = fast_client()
            .get_json::<Payload>(&format!("{}/garbage", server.url()), "x", "test")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::InvalidResponse { .. }));
        mock.assert_async().await;
    }
}
