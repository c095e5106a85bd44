//! OpenAI Provider Implementation (chat completions)

use super::{endpoint, model_for, post_json, ProviderMeta};
use crate::core::ai::prompt::{build_user_prompt, parse_ai_reply, DEFAULT_SYSTEM_PROMPT};
use crate::core::ai::{AIConfig, AIProvider, ProviderError};
use crate::core::models::{AISearchRequest, AISearchResponse};
use crate::core::transport::HttpTransport;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct OpenAIProvider {
    transport: Arc<dyn HttpTransport>,
    meta: &'static ProviderMeta,
}

impl OpenAIProvider {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            meta: &super::OPENAI,
        }
    }

    fn build_body(&self, config: &AIConfig, request: &AISearchRequest) -> Value {
        let system = config.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);

        let mut body = json!({
            "model": model_for(config, self.meta),
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": build_user_prompt(request) }
            ],
            "response_format": { "type": "json_object" }
        });

        if let Some(temperature) = config.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    fn name(&self) -> &str {
        self.meta.id
    }

    async fn search(
        &self,
        config: &AIConfig,
        request: &AISearchRequest,
    ) -> Result<AISearchResponse, ProviderError> {
        let url = endpoint(config, self.meta, "/chat/completions");
        let auth = [("Authorization", format!("Bearer {}", config.api_key.trim()))];

        let json = post_json(
            self.transport.as_ref(),
            url,
            &auth,
            config,
            self.build_body(config, request),
        )
        .await?;

        let content = json["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| ProviderError::malformed("Missing choices[0].message.content"))?;

        parse_ai_reply(content, request)
    }
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider").finish_non_exhaustive()
    }
}
