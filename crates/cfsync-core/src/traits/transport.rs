// # Transport Trait
//
// Defines the leaf interface for talking to the provider API.
//
// ## Responsibilities
//
// - Attach bearer-token authentication and JSON content headers
// - Send exactly one HTTP request per call
// - Hand back the raw status and body
//
// ## Non-responsibilities
//
// - Interpreting the body (owned by `ProviderApi`)
// - Retries or backoff (there are none anywhere in cfsync)
// - Caching (owned by `ZoneMapStore`)
//
// Implementations:
//
// - `cfsync-provider-cloudflare`: reqwest over HTTPS
// - Test doubles in `tests/common`

use async_trait::async_trait;
use std::fmt;

/// HTTP methods used against the provider API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case verb as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// True for methods that change remote state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unparsed provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as received
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for provider transports
///
/// A transport sends one request and returns whatever came back. Any
/// response that arrived, whatever its status, is `Ok`; only failures to
/// obtain a response (DNS, TCP, TLS, timeout, body read) are
/// `Err(Error::Transport)`.
///
/// # Parameters
///
/// - `method`: HTTP method
/// - `path`: path relative to the API base, starting with `/`
/// - `query`: query parameters; the transport URL-encodes them
/// - `body`: optional JSON payload
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, crate::Error>;
}
