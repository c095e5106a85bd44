//! Anthropic Claude Provider Implementation (messages API)

use super::{endpoint, model_for, post_json, ProviderMeta};
use crate::core::ai::prompt::{build_user_prompt, parse_ai_reply, DEFAULT_SYSTEM_PROMPT};
use crate::core::ai::{AIConfig, AIProvider, ProviderError};
use crate::core::models::{AISearchRequest, AISearchResponse};
use crate::core::transport::HttpTransport;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct ClaudeProvider {
    transport: Arc<dyn HttpTransport>,
    meta: &'static ProviderMeta,
}

impl ClaudeProvider {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            meta: &super::CLAUDE,
        }
    }

    fn build_body(&self, config: &AIConfig, request: &AISearchRequest) -> Value {
        let mut body = json!({
            "model": model_for(config, self.meta),
            "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "system": config.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT),
            "messages": [
                { "role": "user", "content": build_user_prompt(request) }
            ]
        });

        if let Some(temperature) = config.temperature {
            // Anthropic caps temperature at 1.0
            body["temperature"] = json!(temperature.min(1.0));
        }

        body
    }
}

#[async_trait]
impl AIProvider for ClaudeProvider {
    fn name(&self) -> &str {
        self.meta.id
    }

    async fn search(
        &self,
        config: &AIConfig,
        request: &AISearchRequest,
    ) -> Result<AISearchResponse, ProviderError> {
        let url = endpoint(config, self.meta, "/messages");
        let headers = [
            ("x-api-key", config.api_key.trim().to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ];

        let json = post_json(
            self.transport.as_ref(),
            url,
            &headers,
            config,
            self.build_body(config, request),
        )
        .await?;

        let content = json["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|block| block["type"] == "text")
                    .and_then(|block| block["text"].as_str())
            })
            .ok_or_else(|| ProviderError::malformed("Missing text content block"))?;

        parse_ai_reply(content, request)
    }
}

impl std::fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProvider").finish_non_exhaustive()
    }
}
