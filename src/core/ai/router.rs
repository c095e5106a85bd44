//! AI Provider Router
//!
//! Explicit registry from provider id to `AIProvider`, built once per
//! orchestrator.

use super::providers::{ClaudeProvider, CustomProvider, GeminiProvider, OpenAIProvider};
use super::{AIConfig, AIProvider, ProviderError, UnknownProviderError, CUSTOM_PROVIDER_ID};
use crate::core::models::{AISearchRequest, AISearchResponse};
use crate::core::transport::HttpTransport;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn AIProvider>>,
}

impl ProviderRouter {
    pub fn builder() -> ProviderRouterBuilder {
        ProviderRouterBuilder::new()
    }

    /// Router with the built-in providers, all using `transport`.
    pub fn with_builtin(transport: Arc<dyn HttpTransport>) -> Self {
        Self::builder().with_builtin(transport).build()
    }

    pub fn register(&mut self, id: impl Into<String>, provider: Arc<dyn AIProvider>) {
        self.providers.insert(normalize_id(&id.into()), provider);
    }

    /// Provider registered under `id` (case and surrounding space ignored).
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn AIProvider>, UnknownProviderError> {
        self.providers
            .get(&normalize_id(id))
            .cloned()
            .ok_or_else(|| UnknownProviderError(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(&normalize_id(id))
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("providers", &self.provider_ids())
            .finish()
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Builder for constructing a ProviderRouter
pub struct ProviderRouterBuilder {
    router: ProviderRouter,
}

impl ProviderRouterBuilder {
    pub fn new() -> Self {
        Self {
            router: ProviderRouter::default(),
        }
    }

    pub fn with_builtin(self, transport: Arc<dyn HttpTransport>) -> Self {
        self.register("openai", Arc::new(OpenAIProvider::new(transport.clone())))
            .register("claude", Arc::new(ClaudeProvider::new(transport.clone())))
            .register("gemini", Arc::new(GeminiProvider::new(transport)))
    }

    pub fn register(mut self, id: impl Into<String>, provider: Arc<dyn AIProvider>) -> Self {
        self.router.register(id, provider);
        self
    }

    /// Register the `custom` provider backed by `handler`.
    pub fn with_custom<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(AIConfig, AISearchRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AISearchResponse, ProviderError>> + Send + 'static,
    {
        self.register(CUSTOM_PROVIDER_ID, Arc::new(CustomProvider::new(handler)))
    }

    pub fn build(self) -> ProviderRouter {
        self.router
    }
}

impl Default for ProviderRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
