//! Google Gemini Provider Implementation (API key, generateContent)

use super::{endpoint, model_for, post_json, ProviderMeta};
use crate::core::ai::prompt::{build_user_prompt, parse_ai_reply, DEFAULT_SYSTEM_PROMPT};
use crate::core::ai::{AIConfig, AIProvider, ProviderError};
use crate::core::models::{AISearchRequest, AISearchResponse};
use crate::core::transport::HttpTransport;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct GeminiProvider {
    transport: Arc<dyn HttpTransport>,
    meta: &'static ProviderMeta,
}

impl GeminiProvider {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            meta: &super::GEMINI,
        }
    }

    fn build_body(&self, config: &AIConfig, request: &AISearchRequest) -> Value {
        let system = config.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);

        let mut gen_config = serde_json::Map::new();
        gen_config.insert("responseMimeType".to_string(), json!("application/json"));
        if let Some(temp) = config.temperature {
            gen_config.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max) = config.max_tokens {
            gen_config.insert("maxOutputTokens".to_string(), json!(max));
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_user_prompt(request) }]
            }],
            "systemInstruction": {
                "parts": [{ "text": system }]
            },
            "generationConfig": Value::Object(gen_config)
        })
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    fn name(&self) -> &str {
        self.meta.id
    }

    async fn search(
        &self,
        config: &AIConfig,
        request: &AISearchRequest,
    ) -> Result<AISearchResponse, ProviderError> {
        let path = format!("/models/{}:generateContent", model_for(config, self.meta));
        let url = endpoint(config, self.meta, &path);
        let headers = [("x-goog-api-key", config.api_key.trim().to_string())];

        let json = post_json(
            self.transport.as_ref(),
            url,
            &headers,
            config,
            self.build_body(config, request),
        )
        .await?;

        let content = json["candidates"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["content"]["parts"].as_array())
            .and_then(|parts| parts.first())
            .and_then(|p| p["text"].as_str())
            .ok_or_else(|| ProviderError::malformed("Missing candidates[0].content.parts[0].text"))?;

        parse_ai_reply(content, request)
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider").finish_non_exhaustive()
    }
}
