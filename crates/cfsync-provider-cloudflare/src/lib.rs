// # Cloudflare HTTPS Transport
//
// This crate provides the reqwest-backed `Transport` for cfsync.
//
// ## Responsibilities
//
// - Build the request URL from the configured API base and a path
// - Attach `Authorization: Bearer <token>`, `Content-Type` and `Accept`
// - URL-encode query parameters and serialize JSON bodies
// - Enforce the HTTP timeout
//
// The transport does not look at response bodies or status codes; that is
// `cfsync_core::ProviderApi`'s job. It performs exactly one request per call
// with no retries.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/

use async_trait::async_trait;
use cfsync_core::config::Config;
use cfsync_core::traits::{Method, RawResponse, Transport};
use cfsync_core::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("cfsync/", env!("CARGO_PKG_VERSION"));

/// Cloudflare API v4 transport
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareTransport {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP timeout, kept for diagnostics
    timeout: Duration,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareTransport")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CloudflareTransport {
    /// Create a transport from resolved configuration
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be
    /// built.
    pub fn new(config: &Config) -> Result<Self> {
        if config.api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token: config.api_token.clone(),
            api_base: config.api_base_trimmed().to_string(),
            timeout,
            client,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

#[async_trait]
impl Transport for CloudflareTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let url = self.url(path);
        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        }
        .bearer_auth(&self.api_token)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json");

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let kind = if e.is_timeout() {
                "timed out"
            } else if e.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            Error::transport(format!("{} {} {}: {}", method, path, kind, e.without_url()))
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            Error::transport(format!(
                "{} {}: failed to read response body: {}",
                method,
                path,
                e.without_url()
            ))
        })?;

        tracing::trace!("{} {} -> {} ({} bytes)", method, path, status, text.len());
        Ok(RawResponse::new(status, text))
    }
}
