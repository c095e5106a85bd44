//! AI Provider Implementations
//!
//! Concrete `AIProvider` implementations plus the canonical provider
//! metadata table.
//!
//! Adding a new built-in provider requires:
//! 1. A new entry in `PROVIDERS`
//! 2. The provider implementation file
//! 3. Registration in `ProviderRouterBuilder::with_builtin`

mod claude;
mod custom;
mod gemini;
mod openai;

pub use claude::ClaudeProvider;
pub use custom::CustomProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use super::{AIConfig, ProviderError};
use crate::core::transport::{HttpTransport, TransportRequest};
use serde_json::Value;

/// Id of the caller-supplied provider slot.
pub const CUSTOM_PROVIDER_ID: &str = "custom";

// ── Provider metadata ───────────────────────────────────────────────────────

/// Static metadata for a built-in provider.
#[derive(Clone, Debug)]
pub struct ProviderMeta {
    pub id: &'static str,
    pub display_name: &'static str,
    pub default_model: &'static str,
    pub default_base_url: &'static str,
    pub key_placeholder: &'static str,
}

pub static OPENAI: ProviderMeta = ProviderMeta {
    id: "openai",
    display_name: "OpenAI",
    default_model: "gpt-4o-mini",
    default_base_url: "https://api.openai.com/v1",
    key_placeholder: "sk-...",
};

pub static CLAUDE: ProviderMeta = ProviderMeta {
    id: "claude",
    display_name: "Anthropic Claude",
    default_model: "claude-3-5-haiku-latest",
    default_base_url: "https://api.anthropic.com/v1",
    key_placeholder: "sk-ant-...",
};

pub static GEMINI: ProviderMeta = ProviderMeta {
    id: "gemini",
    display_name: "Google Gemini",
    default_model: "gemini-2.0-flash",
    default_base_url: "https://generativelanguage.googleapis.com/v1beta",
    key_placeholder: "AIza...",
};

/// Canonical table of built-in providers. Single source of truth.
pub static PROVIDERS: &[&ProviderMeta] = &[&OPENAI, &CLAUDE, &GEMINI];

/// Look up a built-in provider by id.
pub fn find_provider_meta(id: &str) -> Option<&'static ProviderMeta> {
    PROVIDERS.iter().copied().find(|p| p.id == id)
}

/// Built-in ids plus `custom`.
pub fn is_known_provider(id: &str) -> bool {
    id == CUSTOM_PROVIDER_ID || find_provider_meta(id).is_some()
}

// ── Shared request plumbing ─────────────────────────────────────────────────

/// Model from config, else the provider default.
fn model_for<'a>(config: &'a AIConfig, meta: &'static ProviderMeta) -> &'a str {
    config
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(meta.default_model)
}

/// `{base_url}{path}`, with `base_url` from config when set.
fn endpoint(config: &AIConfig, meta: &'static ProviderMeta, path: &str) -> String {
    let base = config
        .base_url
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or(meta.default_base_url);
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// POST `body` to `url` with provider headers, then config custom headers on top.
async fn post_json(
    transport: &dyn HttpTransport,
    url: String,
    headers: &[(&str, String)],
    config: &AIConfig,
    body: Value,
) -> Result<Value, ProviderError> {
    let mut request = TransportRequest::post(url, body).with_header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.with_header(*name, value.clone());
    }
    for (name, value) in &config.custom_headers {
        request = request.with_header(name.clone(), value.clone());
    }

    let response = transport.request(request).await?;
    Ok(response.data)
}
