//! Provider Router Tests

use std::sync::Arc;

use crate::core::ai::{AIConfig, MockAIProvider, ProviderError, ProviderRouter};
use crate::core::models::{AISearchRequest, AISearchResponse};
use crate::core::transport::{HttpTransport, MockHttpTransport};

fn empty_response(query: &str) -> AISearchResponse {
    AISearchResponse {
        results: Vec::new(),
        total: Some(0),
        query: query.to_string(),
        message: None,
        ai_generated: Some(true),
        ai_explanation: None,
        original_query: Some(query.to_string()),
    }
}

#[test]
fn test_builtin_ids() {
    let transport: Arc<dyn HttpTransport> = Arc::new(MockHttpTransport::new());
    let router = ProviderRouter::with_builtin(transport);

    assert_eq!(router.provider_ids(), vec!["claude", "gemini", "openai"]);
    assert!(router.contains(" OpenAI "));
    assert_eq!(router.resolve("Claude").unwrap().name(), "claude");
}

#[test]
fn test_unknown_provider() {
    // MockHttpTransport with no expectations panics if it is called
    let transport: Arc<dyn HttpTransport> = Arc::new(MockHttpTransport::new());
    let router = ProviderRouter::with_builtin(transport);

    let err = router.resolve("unknown-x").err().unwrap();
    assert_eq!(err.to_string(), "Unknown AI provider: unknown-x");
}

#[tokio::test]
async fn test_registered_provider_is_invoked() {
    let mut provider = MockAIProvider::new();
    provider
        .expect_search()
        .times(1)
        .returning(|_config, request| Ok(empty_response(&request.query)));

    let router = ProviderRouter::builder()
        .register("Local", Arc::new(provider))
        .build();

    let resolved = router.resolve("local").unwrap();
    let response = resolved
        .search(&AIConfig::new("local", "k"), &AISearchRequest::new("golems"))
        .await
        .unwrap();
    assert_eq!(response.query, "golems");
}

#[tokio::test]
async fn test_custom_handler_receives_config_and_request() {
    let router = ProviderRouter::builder()
        .with_custom(|config: AIConfig, request: AISearchRequest| async move {
            if config.api_key != "secret" {
                return Err(ProviderError::Authentication("wrong key".to_string()));
            }
            Ok(empty_response(&request.query))
        })
        .build();

    let custom = router.resolve("custom").unwrap();
    assert_eq!(custom.name(), "custom");

    let ok = custom
        .search(&AIConfig::new("custom", "secret"), &AISearchRequest::new("imps"))
        .await
        .unwrap();
    assert_eq!(ok.original_query.as_deref(), Some("imps"));

    let err = custom
        .search(&AIConfig::new("custom", "nope"), &AISearchRequest::new("imps"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Authentication(_)));
}
