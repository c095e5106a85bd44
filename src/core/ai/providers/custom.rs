//! Custom Provider
//!
//! Delegates to a caller-supplied async function; performs no I/O itself.

use crate::core::ai::{AIConfig, AIProvider, ProviderError, CUSTOM_PROVIDER_ID};
use crate::core::models::{AISearchRequest, AISearchResponse};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

type Handler = Arc<
    dyn Fn(AIConfig, AISearchRequest) -> BoxFuture<'static, Result<AISearchResponse, ProviderError>>
        + Send
        + Sync,
>;

pub struct CustomProvider {
    handler: Handler,
}

impl CustomProvider {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(AIConfig, AISearchRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AISearchResponse, ProviderError>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |config, request| Box::pin(handler(config, request))),
        }
    }
}

#[async_trait]
impl AIProvider for CustomProvider {
    fn name(&self) -> &str {
        CUSTOM_PROVIDER_ID
    }

    async fn search(
        &self,
        config: &AIConfig,
        request: &AISearchRequest,
    ) -> Result<AISearchResponse, ProviderError> {
        (self.handler)(config.clone(), request.clone()).await
    }
}

impl std::fmt::Debug for CustomProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomProvider").finish_non_exhaustive()
    }
}
