//! Transport Error Types

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failure of a single transport call, classified by cause.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Server answered with a non-2xx status.
    #[error("HTTP {status} {status_text}")]
    Status {
        status: u16,
        status_text: String,
        /// Response body (JSON, or a JSON string for non-JSON bodies).
        body: Value,
        /// Seconds from a `Retry-After` header, when present.
        retry_after: Option<u64>,
    },

    /// Call did not complete within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Cancellation signal fired before the call resolved.
    #[error("Request cancelled")]
    Cancelled,

    /// Redirect received while the redirect policy is `error`.
    #[error("Unexpected redirect ({status}) to {}", location.as_deref().unwrap_or("<unknown>"))]
    Redirect { status: u16, location: Option<String> },

    /// Response body could not be read.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request could not be built (bad URL, bad header).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// HTTP status, for `Status` and `Redirect` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } | TransportError::Redirect { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }

    /// Network-level failures: no HTTP answer was obtained.
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }

    /// Convenience constructor for a status failure without a body.
    pub fn status_code(status: u16, status_text: impl Into<String>) -> Self {
        TransportError::Status {
            status,
            status_text: status_text.into(),
            body: Value::Null,
            retry_after: None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_decode() || err.is_body() {
            TransportError::Decode(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout(Duration::ZERO)
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
