//! Claude Provider Unit Tests

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{http, reply_text};
use crate::core::ai::{AIConfig, AIProvider, ClaudeProvider, ProviderError};
use crate::core::models::AISearchRequest;

fn config(server: &MockServer) -> AIConfig {
    AIConfig::new("claude", "sk-ant-test").with_base_url(server.uri())
}

#[tokio::test]
async fn test_messages_request_and_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-haiku-latest",
            "max_tokens": 1024,
            "system": "Only monsters."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": format!("```json\n{}\n```", reply_text()) }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = ClaudeProvider::new(http())
        .search(
            &config(&server).with_system_prompt("Only monsters."),
            &AISearchRequest::new("red dragon").with_category(Some("monsters".to_string())),
        )
        .await
        .unwrap();

    assert_eq!(response.results[0].title, "Ancient Red Dragon");
    assert_eq!(response.query, "red dragon");
    assert_eq!(response.total, Some(2));
}

#[tokio::test]
async fn test_reply_without_results_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "{\"answer\": \"dragons\"}" }]
        })))
        .mount(&server)
        .await;

    let err = ClaudeProvider::new(http())
        .search(&config(&server), &AISearchRequest::new("q"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_forbidden_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "type": "error",
            "error": { "type": "permission_error", "message": "Key lacks permission" }
        })))
        .mount(&server)
        .await;

    let err = ClaudeProvider::new(http())
        .search(&config(&server), &AISearchRequest::new("q"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Authentication(ref m) if m == "Key lacks permission"));
}
