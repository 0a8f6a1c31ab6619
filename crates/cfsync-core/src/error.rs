//! Error types for cfsync
//!
//! One enum covers the whole taxonomy: configuration, transport, malformed
//! provider responses, provider-reported failures and zone-map I/O.

use thiserror::Error;

/// Result type alias for cfsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cfsync
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or incomplete credentials, invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or TLS failure while talking to the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body is not valid JSON or lacks expected fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Zone-map file could not be read or written
    #[error("Zone map I/O error: {0}")]
    StoreIo(String),

    /// Provider answered but rejected the request
    #[error("Provider API error ({status}): {message}")]
    Api {
        /// HTTP status of the response
        status: u16,
        /// Messages reported by the provider
        message: String,
    },

    /// Authentication errors (401/403)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or record not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local I/O errors outside the zone map
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors for outgoing payloads
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a zone-map I/O error
    pub fn store_io(msg: impl Into<String>) -> Self {
        Self::StoreIo(msg.into())
    }

    /// Create a provider API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for errors where the provider was never reached or its answer
    /// could not be understood.
    pub fn is_communication_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::MalformedResponse(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
