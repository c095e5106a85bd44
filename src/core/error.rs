//! Search Error Types
//!
//! Crate-level error unifying every failure a search flow can hit.

use crate::config::ConfigError;
use crate::core::ai::{ProviderError, UnknownProviderError};
use crate::core::transform::TransformError;
use crate::core::transport::TransportError;
use thiserror::Error;

/// Search flow errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Query must be at least {min} characters")]
    QueryTooShort { min: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProviderError),

    #[error("AI search is disabled or has no API key")]
    AiUnavailable,

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SearchError {
    /// Whether this error is a consequence of cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            SearchError::Cancelled | SearchError::Transport(TransportError::Cancelled)
        ) || matches!(self, SearchError::Provider(ProviderError::Cancelled))
    }

    /// Message suitable for display next to the search box.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::QueryTooShort { min } => {
                format!("Type at least {} characters to search", min)
            }
            SearchError::Transport(err) => match err {
                TransportError::Status { status, .. } if *status >= 500 => {
                    format!("Search service error (HTTP {}). Please try again later.", status)
                }
                TransportError::Status {
                    status, status_text, ..
                } => {
                    if status_text.is_empty() {
                        format!("Search request failed (HTTP {})", status)
                    } else {
                        format!("Search request failed (HTTP {} {})", status, status_text)
                    }
                }
                TransportError::Timeout(_) => "Search request timed out".to_string(),
                TransportError::Network(_) => {
                    "Could not reach the search service. Check your connection.".to_string()
                }
                TransportError::Cancelled => "Search cancelled".to_string(),
                TransportError::Redirect { .. } => {
                    "Search service answered with an unexpected redirect".to_string()
                }
                TransportError::Decode(_) => "Could not read the search response".to_string(),
                TransportError::InvalidRequest(detail) => {
                    format!("Invalid search request: {}", detail)
                }
            },
            SearchError::Transform(err) => format!("Unexpected search response: {}", err),
            SearchError::Provider(err) => match err {
                ProviderError::Authentication(_) => {
                    "AI provider rejected the API key".to_string()
                }
                ProviderError::RateLimited { .. } => {
                    "AI provider rate limit reached. Please wait and try again.".to_string()
                }
                ProviderError::MalformedResponse(_) => {
                    "AI provider returned an unreadable answer".to_string()
                }
                ProviderError::Network(_) => "Could not reach the AI provider".to_string(),
                ProviderError::Api { status, .. } => {
                    format!("AI provider error (HTTP {})", status)
                }
                ProviderError::Cancelled => "AI search cancelled".to_string(),
            },
            SearchError::UnknownProvider(err) => err.to_string(),
            SearchError::AiUnavailable => {
                "AI search is not available. Enable it and provide an API key.".to_string()
            }
            SearchError::Cancelled => "Search cancelled".to_string(),
            SearchError::Config(err) => format!("Configuration problem: {}", err),
        }
    }
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
