//! AI-Augmented Search
//!
//! Provider registry mapping `AIConfig.provider` to a concrete backend call.
//! Built-in providers (OpenAI, Claude, Gemini) issue their requests through
//! the same `HttpTransport` as the search channels; `custom` delegates to a
//! caller-supplied function.

mod config;
mod prompt;
pub mod providers;
mod router;

pub use config::AIConfig;
pub use prompt::{build_user_prompt, parse_ai_reply, DEFAULT_SYSTEM_PROMPT};
pub use providers::{
    find_provider_meta, is_known_provider, ClaudeProvider, CustomProvider, GeminiProvider,
    OpenAIProvider, ProviderMeta, CUSTOM_PROVIDER_ID, PROVIDERS,
};
pub use router::{ProviderRouter, ProviderRouterBuilder};

use crate::core::models::{AISearchRequest, AISearchResponse};
use crate::core::transport::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Failure of a provider invocation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider call cancelled")]
    Cancelled,
}

impl ProviderError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ProviderError::MalformedResponse(message.into())
    }

    /// Whether a later identical call might succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::Network(_)
        ) || matches!(self, ProviderError::Api { status, .. } if *status >= 500)
    }

    /// Classify a transport failure from a provider endpoint.
    pub fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Status {
                status,
                status_text,
                body,
                retry_after,
            } => {
                let message = error_message(&body).unwrap_or(status_text);
                match status {
                    401 | 403 => ProviderError::Authentication(message),
                    402 | 429 => ProviderError::RateLimited {
                        message,
                        retry_after,
                    },
                    _ => ProviderError::Api { status, message },
                }
            }
            TransportError::Cancelled => ProviderError::Cancelled,
            TransportError::Decode(message) => ProviderError::MalformedResponse(message),
            other => ProviderError::Network(other.to_string()),
        }
    }
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        ProviderError::from_transport(err)
    }
}

/// Best-effort extraction of an error message from a provider error body.
fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .or_else(|| body.get("message").and_then(Value::as_str))
        .or_else(|| body.as_str())
        .map(str::to_string)
}

/// Provider id not present in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown AI provider: {0}")]
pub struct UnknownProviderError(pub String);

// ============================================================================
// Provider Trait
// ============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AIProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        config: &AIConfig,
        request: &AISearchRequest,
    ) -> Result<AISearchResponse, ProviderError>;
}
