//! AI Search Configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

fn default_provider() -> String {
    "openai".to_string()
}

fn default_toggle_label() -> String {
    "AI Search".to_string()
}

fn default_show_toggle() -> bool {
    true
}

/// Settings for AI-augmented search.
///
/// The AI flow is reachable only when `enabled` is set and `api_key` is
/// non-empty (see [`AIConfig::is_usable`]).
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AIConfig {
    /// Provider id: `openai`, `claude`, `gemini` or `custom`.
    pub provider: String,
    pub api_key: String,
    pub model: Option<String>,
    /// Overrides the provider's default API root.
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub enabled: bool,
    #[serde(default = "default_show_toggle")]
    pub show_toggle: bool,
    pub toggle_label: String,
    pub custom_headers: BTreeMap<String, String>,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: None,
            base_url: None,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
            enabled: false,
            show_toggle: default_show_toggle(),
            toggle_label: default_toggle_label(),
            custom_headers: BTreeMap::new(),
        }
    }
}

impl AIConfig {
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enabled and keyed.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }

    /// Normalized provider id used for registry lookup.
    pub fn provider_id(&self) -> String {
        self.provider.trim().to_lowercase()
    }
}

impl fmt::Debug for AIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AIConfig")
            .field("provider", &self.provider)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("enabled", &self.enabled)
            .field("custom_headers", &self.custom_headers.keys().collect::<Vec<_>>())
            .finish()
    }
}
