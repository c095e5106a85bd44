//! Search Orchestrator Unit Tests
//!
//! Covers the three channel flows end to end over a scripted transport:
//! - Autocomplete gating, debouncing, caching and staleness
//! - Explicit search submission and failure reporting
//! - AI search routing through the provider registry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::core::ai::{AIConfig, ProviderError, ProviderRouter};
use crate::core::error::SearchError;
use crate::core::lifecycle::Channel;
use crate::core::models::{AISearchResponse, SearchRequestData, SearchResult, Suggestion};
use crate::core::orchestrator::{
    ChannelStatus, InputOutcome, SearchEvent, SearchOrchestrator, SearchOrchestratorBuilder,
};
use crate::core::transform::{TransformError, TransformPipeline, Transforms};
use crate::core::transport::{HttpMethod, RequestConfig, TransportResponse};
use crate::tests::mocks::{
    drain, orchestrator, orchestrator_with, query_of, results_for, settings, status_error,
    suggestions_for, ScriptedTransport,
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn custom_router() -> ProviderRouter {
    ProviderRouter::builder()
        .with_custom(|_config, request| async move {
            Ok::<_, ProviderError>(AISearchResponse {
                results: vec![SearchResult {
                    id: 1,
                    title: format!("Generated for {}", request.query),
                    description: None,
                    kind: "ai".to_string(),
                    category: request.category.clone(),
                    url: String::new(),
                }],
                total: Some(1),
                query: String::new(),
                message: None,
                ai_generated: Some(true),
                ai_explanation: Some("Matched on theme".to_string()),
                original_query: None,
            })
        })
        .build()
}

// =============================================================================
// Autocomplete Gate
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_query_below_min_length_sends_nothing() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let mut config = settings();
    config.min_query_length = 3;
    let (search, mut events) = orchestrator(config, transport.clone());

    assert_eq!(search.handle_input_change("ab"), InputOutcome::BelowThreshold);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.call_count(), 0);
    let state = search.snapshot();
    assert!(state.suggestions().is_empty());
    assert_eq!(state.autocomplete.status, ChannelStatus::Idle);
    assert_eq!(state.query, "ab");
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_gate_counts_trimmed_characters() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let mut config = settings();
    config.min_query_length = 3;
    let (search, _events) = orchestrator(config, transport.clone());

    assert_eq!(search.handle_input_change("  ab  "), InputOutcome::BelowThreshold);
    assert_eq!(search.handle_input_change("éàü"), InputOutcome::Scheduled);
}

#[tokio::test(start_paused = true)]
async fn test_shrinking_below_threshold_clears_suggestions() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let (search, _events) = orchestrator(settings(), transport.clone());

    search.fetch_suggestions("abc").unwrap().finished().await;
    assert_eq!(search.snapshot().suggestions().len(), 2);

    assert_eq!(search.handle_input_change("a"), InputOutcome::BelowThreshold);
    assert!(search.snapshot().suggestions().is_empty());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_autocomplete_disabled() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let mut config = settings();
    config.autocomplete = false;
    let (search, _events) = orchestrator(config, transport.clone());

    assert_eq!(search.handle_input_change("dragon"), InputOutcome::Disabled);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.call_count(), 0);
    assert_eq!(search.snapshot().query, "dragon");
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_edits_within_debounce_send_one_request() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let (search, mut events) = orchestrator(settings(), transport.clone());

    assert_eq!(search.handle_input_change("ab"), InputOutcome::Scheduled);
    tokio::time::sleep(ms(100)).await;
    assert_eq!(search.handle_input_change("abc"), InputOutcome::Scheduled);
    assert_eq!(search.snapshot().autocomplete.status, ChannelStatus::Gated);

    tokio::time::sleep(ms(299)).await;
    assert_eq!(transport.call_count(), 0);

    tokio::time::sleep(ms(2)).await;
    assert_eq!(transport.queries(), vec!["abc".to_string()]);

    let state = search.snapshot();
    assert_eq!(state.autocomplete.status, ChannelStatus::Succeeded);
    assert_eq!(state.suggestions()[0].text, "abc one");

    let events = drain(&mut events);
    assert!(matches!(&events[0], SearchEvent::AutocompleteRequested(ctx) if ctx.query == "abc"));
    assert!(matches!(&events[1], SearchEvent::Suggestions { query, .. } if query == "abc"));
    assert_eq!(events.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_sends_last_query() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let (search, _events) = orchestrator(settings(), transport.clone());

    for query in ["dr", "dra", "drag", "drago", "dragon"] {
        search.handle_input_change(query);
        tokio::time::sleep(ms(50)).await;
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.queries(), vec!["dragon".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_suggestions_bypasses_debounce() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let (search, _events) = orchestrator(settings(), transport.clone());

    search.handle_input_change("dra");
    let ticket = search.fetch_suggestions("dragon").unwrap();
    assert_eq!(ticket.channel(), Channel::Autocomplete);
    ticket.finished().await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.queries(), vec!["dragon".to_string()]);
}

// =============================================================================
// Staleness
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_superseded_autocomplete_never_overwrites() {
    let transport = Arc::new(
        ScriptedTransport::echo_suggestions()
            .then_after(ms(500), |request| {
                Ok(TransportResponse::ok(suggestions_for(&query_of(request))))
            })
            .then_after(ms(10), |request| {
                Ok(TransportResponse::ok(suggestions_for(&query_of(request))))
            }),
    );
    let (search, mut events) = orchestrator(settings(), transport.clone());

    let first = search.fetch_suggestions("abc").unwrap();
    tokio::time::sleep(ms(1)).await;
    let second = search.fetch_suggestions("abcd").unwrap();
    assert!(second.id() > first.id());

    first.finished().await;
    second.finished().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.queries(), vec!["abc".to_string(), "abcd".to_string()]);
    let state = search.snapshot();
    assert_eq!(state.autocomplete.query, "abcd");
    assert_eq!(state.suggestions()[0].text, "abcd one");
    assert!(search.cached("", "abc").is_none());
    assert!(search.cached("", "abcd").is_some());

    let events = drain(&mut events);
    let suggestion_queries: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            SearchEvent::Suggestions { query, .. } => Some(query.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(suggestion_queries, vec!["abcd"]);
    assert!(!events
        .iter()
        .any(|event| matches!(event, SearchEvent::AutocompleteError(_))));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_search_never_overwrites() {
    let transport = Arc::new(
        ScriptedTransport::new(|request| Ok(TransportResponse::ok(results_for(&query_of(request)))))
            .then_after(ms(500), |request| {
                Ok(TransportResponse::ok(results_for(&query_of(request))))
            }),
    );
    let (search, mut events) = orchestrator(settings(), transport.clone());

    let slow = search.submit_search("owlbear").unwrap();
    tokio::time::sleep(ms(1)).await;
    let fast = search.submit_search("owlbear den").unwrap();

    fast.finished().await;
    slow.finished().await;

    let state = search.snapshot();
    assert_eq!(state.search.status, ChannelStatus::Succeeded);
    assert_eq!(state.search.data.unwrap().query, "owlbear den");

    let finished: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, SearchEvent::Search(_) | SearchEvent::SearchError(_)))
        .collect();
    assert_eq!(finished.len(), 1);
}

/// Custom provider that answers after `delay` for queries starting with
/// "slow", and fails those containing "broken".
fn paced_router(calls: Arc<AtomicUsize>) -> ProviderRouter {
    ProviderRouter::builder()
        .with_custom(move |_config, request| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if request.query.starts_with("slow") {
                    tokio::time::sleep(ms(500)).await;
                }
                if request.query.contains("broken") {
                    return Err(ProviderError::Network("vendor unreachable".to_string()));
                }
                Ok(AISearchResponse {
                    results: Vec::new(),
                    total: Some(0),
                    query: request.query.clone(),
                    message: None,
                    ai_generated: Some(true),
                    ai_explanation: Some(format!("Answer for {}", request.query)),
                    original_query: None,
                })
            }
        })
        .build()
}

fn ai_orchestrator(
    calls: Arc<AtomicUsize>,
) -> (SearchOrchestrator, UnboundedReceiver<SearchEvent>) {
    let transport = Arc::new(ScriptedTransport::replying(json!({})));
    let builder = SearchOrchestratorBuilder::new(settings())
        .with_ai_config(AIConfig::new("custom", "key"))
        .with_providers(paced_router(calls));
    orchestrator_with(builder, transport)
}

#[tokio::test(start_paused = true)]
async fn test_superseded_ai_search_never_overwrites() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (search, mut events) = ai_orchestrator(calls.clone());

    let slow = search.submit_ai_search("slow lich lore", None).unwrap();
    tokio::time::sleep(ms(1)).await;
    let fast = search.submit_ai_search("lich phylactery", None).unwrap();

    fast.finished().await;
    slow.finished().await;
    tokio::time::sleep(ms(1_000)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let state = search.snapshot();
    assert_eq!(state.ai_search.status, ChannelStatus::Succeeded);
    let response = state.ai_search.data.unwrap();
    assert_eq!(response.query, "lich phylactery");
    assert_eq!(response.ai_explanation.as_deref(), Some("Answer for lich phylactery"));

    let finished: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, SearchEvent::AiSearch(_) | SearchEvent::AiSearchError(_)))
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(matches!(&finished[0], SearchEvent::AiSearch(r) if r.query == "lich phylactery"));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_ai_failure_stays_silent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (search, mut events) = ai_orchestrator(calls.clone());

    let slow = search.submit_ai_search("slow broken oracle", None).unwrap();
    tokio::time::sleep(ms(1)).await;
    let fast = search.submit_ai_search("oracle", None).unwrap();

    fast.finished().await;
    slow.finished().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let state = search.snapshot();
    assert_eq!(state.ai_search.status, ChannelStatus::Succeeded);
    assert!(state.ai_search.error.is_none());
    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, SearchEvent::AiSearchError(_))));
}

// =============================================================================
// Cache
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_successful_autocomplete_is_cached() {
    let transport = Arc::new(ScriptedTransport::replying(json!({
        "suggestions": [{ "id": 1, "text": "foo" }],
        "query": "foo"
    })));
    let (search, _events) = orchestrator(settings(), transport.clone());

    search.fetch_suggestions("foo").unwrap().finished().await;

    let entry = search.cached("", "foo").expect("cache entry");
    assert_eq!(entry.suggestions, vec![Suggestion::new(1i64, "foo")]);
}

#[tokio::test(start_paused = true)]
async fn test_show_cached_skips_transport() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let (search, mut events) = orchestrator(settings(), transport.clone());

    search.fetch_suggestions("foo").unwrap().finished().await;
    search.clear_suggestions();
    assert!(search.snapshot().suggestions().is_empty());
    drain(&mut events);

    let shown = search.show_cached("  FOO ").expect("cached suggestions");
    assert_eq!(shown.len(), 2);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(search.snapshot().autocomplete.status, ChannelStatus::Succeeded);
    assert!(matches!(&drain(&mut events)[..], [SearchEvent::Suggestions { .. }]));

    search.clear_suggestions();
    assert_eq!(search.handle_input_focus().map(|s| s.len()), Some(2));
    assert!(search.show_cached("bar").is_none());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_category_scopes_requests_and_cache() {
    let transport = Arc::new(ScriptedTransport::echo_suggestions());
    let (search, _events) = orchestrator(settings(), transport.clone());

    search.set_category(" spells ");
    search.fetch_suggestions("fire").unwrap().finished().await;

    let call = &transport.calls()[0];
    assert_eq!(call.data.as_ref().unwrap()["category"], "spells");
    assert!(search.cached("spells", "fire").is_some());
    assert!(search.cached("", "fire").is_none());

    search.set_category("");
    assert!(search.show_cached("fire").is_none());
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_search_failure_sets_failed_state() {
    let mut config = settings();
    config.autocomplete_url = Some("http://search.test/suggest".to_string());
    let transport = Arc::new(ScriptedTransport::new(|request| {
        if request.url.ends_with("/suggest") {
            Ok(TransportResponse::ok(suggestions_for(&query_of(request))))
        } else {
            Err(status_error(500))
        }
    }));
    let (search, mut events) = orchestrator(config, transport.clone());

    search.fetch_suggestions("lich").unwrap().finished().await;
    let cached_before = search.cached("", "lich");
    drain(&mut events);

    search.submit_search("lich").unwrap().finished().await;

    let state = search.snapshot();
    assert_eq!(state.search.status, ChannelStatus::Failed);
    assert!(state.search.data.is_none());
    let message = state.search.error.expect("error message");
    assert_eq!(
        message,
        "Search service error (HTTP 500). Please try again later."
    );

    let events = drain(&mut events);
    assert!(matches!(&events[0], SearchEvent::SearchStarted(ctx) if ctx.query == "lich"));
    assert_eq!(events[1], SearchEvent::SearchError(message));
    assert_eq!(search.cached("", "lich"), cached_before);
    // No retry
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_submit_search_cancels_pending_autocomplete() {
    let transport = Arc::new(ScriptedTransport::new(|request| {
        Ok(TransportResponse::ok(results_for(&query_of(request))))
    }));
    let (search, _events) = orchestrator(settings(), transport.clone());

    assert_eq!(search.handle_input_change("beholder"), InputOutcome::Scheduled);
    let ticket = search.submit_search("beholder").unwrap();
    assert_eq!(ticket.channel(), Channel::Search);
    ticket.finished().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.call_count(), 1);
    let state = search.snapshot();
    assert_eq!(state.autocomplete.status, ChannelStatus::Idle);
    assert_eq!(state.search.data.unwrap().results[0].title, "About beholder");
}

#[tokio::test(start_paused = true)]
async fn test_search_below_min_search_length() {
    let transport = Arc::new(ScriptedTransport::replying(json!({ "results": [] })));
    let mut config = settings();
    config.min_search_length = 3;
    let (search, mut events) = orchestrator(config, transport.clone());

    assert!(search.submit_search(" ab ").is_none());
    assert!(search.submit_search("").is_none());
    assert_eq!(transport.call_count(), 0);
    assert_eq!(search.snapshot().search.status, ChannelStatus::Idle);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_query_echo_is_backfilled() {
    let transport = Arc::new(ScriptedTransport::replying(json!({
        "results": [{ "id": "12", "title": "Tarrasque" }]
    })));
    let (search, _events) = orchestrator(settings(), transport.clone());

    search.submit_search("tarrasque").unwrap().finished().await;

    let response = search.snapshot().search.data.unwrap();
    assert_eq!(response.query, "tarrasque");
    assert_eq!(response.results[0].id, 12);
    assert_eq!(response.total_or_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_method_sends_query_parameters() {
    let transport = Arc::new(ScriptedTransport::replying(json!({ "results": [] })));
    let builder = SearchOrchestratorBuilder::new(settings())
        .with_request_config(RequestConfig::new().with_method(HttpMethod::Get));
    let (search, _events) = orchestrator_with(builder, transport.clone());

    let mut filters = serde_json::Map::new();
    filters.insert("status".to_string(), json!("published"));
    search.set_filters(filters);
    search.submit_search("kobold").unwrap().finished().await;

    let call = &transport.calls()[0];
    assert_eq!(call.method, Some(HttpMethod::Get));
    assert!(call.data.is_none());
    assert!(call.params.contains(&("query".to_string(), "kobold".to_string())));
    assert!(call
        .params
        .contains(&("filters".to_string(), r#"{"status":"published"}"#.to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_transform_hooks_shape_request_and_response() {
    let transport = Arc::new(ScriptedTransport::replying(json!({
        "hits": [{ "id": 3, "title": "Gelatinous Cube" }]
    })));
    let transforms = Transforms::new().with_search(
        TransformPipeline::new()
            .with_request(|ctx: &SearchRequestData| Ok(json!({ "q": ctx.query, "size": 5 })))
            .with_response(|raw| Ok(json!({ "results": raw["hits"].clone() }))),
    );
    let builder = SearchOrchestratorBuilder::new(settings()).with_transforms(transforms);
    let (search, _events) = orchestrator_with(builder, transport.clone());

    search.submit_search("cube").unwrap().finished().await;

    assert_eq!(
        transport.calls()[0].data,
        Some(json!({ "q": "cube", "size": 5 }))
    );
    let response = search.snapshot().search.data.unwrap();
    assert_eq!(response.results[0].title, "Gelatinous Cube");
}

#[tokio::test(start_paused = true)]
async fn test_transform_failure_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::replying(json!({ "items": [] })));
    let (search, mut events) = orchestrator(settings(), transport.clone());

    search.submit_search("mimic").unwrap().finished().await;

    let state = search.snapshot();
    assert_eq!(state.search.status, ChannelStatus::Failed);
    let expected = SearchError::from(TransformError::MissingField("results")).user_message();
    assert_eq!(state.search.error.as_deref(), Some(expected.as_str()));
    assert_eq!(transport.call_count(), 1);
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, SearchEvent::SearchError(_))));
}

#[tokio::test(start_paused = true)]
async fn test_select_suggestion_and_search() {
    let transport = Arc::new(ScriptedTransport::new(|request| {
        Ok(TransportResponse::ok(results_for(&query_of(request))))
    }));
    let (search, mut events) = orchestrator(settings(), transport.clone());

    let suggestion = Suggestion::new(4i64, "mind flayer");
    search
        .select_suggestion_and_search(&suggestion)
        .unwrap()
        .finished()
        .await;

    assert_eq!(search.snapshot().query, "mind flayer");
    let events = drain(&mut events);
    assert_eq!(events[0], SearchEvent::SuggestionSelected(suggestion.clone()));
    assert_eq!(events[1], SearchEvent::SuggestionSelectedAndSearch(suggestion));
    assert!(matches!(&events[2], SearchEvent::SearchStarted(ctx) if ctx.query == "mind flayer"));
    assert!(matches!(&events[3], SearchEvent::Search(response) if response.query == "mind flayer"));
}

#[tokio::test(start_paused = true)]
async fn test_clear_results_discards_in_flight_search() {
    let transport = Arc::new(
        ScriptedTransport::replying(json!({ "results": [] })).then_after(ms(500), |request| {
            Ok(TransportResponse::ok(results_for(&query_of(request))))
        }),
    );
    let (search, mut events) = orchestrator(settings(), transport.clone());

    let ticket = search.submit_search("ghoul").unwrap();
    tokio::time::sleep(ms(1)).await;
    assert!(search.snapshot().search.is_loading());

    search.clear_results();
    ticket.finished().await;

    let state = search.snapshot();
    assert_eq!(state.search.status, ChannelStatus::Idle);
    assert!(state.search.data.is_none());
    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], SearchEvent::SearchStarted(_)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_everything() {
    let transport = Arc::new(
        ScriptedTransport::echo_suggestions().then_after(Duration::from_secs(5), |request| {
            Ok(TransportResponse::ok(results_for(&query_of(request))))
        }),
    );
    let (search, mut events) = orchestrator(settings(), transport.clone());

    let ticket = search.submit_search("lich").unwrap();
    tokio::time::sleep(ms(1)).await;
    search.handle_input_change("lich queen");
    search.shutdown();
    ticket.finished().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(transport.call_count(), 1);
    let state = search.snapshot();
    assert_eq!(state.search.status, ChannelStatus::Idle);
    assert_eq!(state.autocomplete.status, ChannelStatus::Idle);
    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, SearchEvent::Search(_) | SearchEvent::SearchError(_))));
}

// =============================================================================
// AI Search
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_unknown_provider_fails_without_transport_call() {
    let transport = Arc::new(ScriptedTransport::replying(json!({})));
    let builder =
        SearchOrchestratorBuilder::new(settings()).with_ai_config(AIConfig::new("unknown-x", "key"));
    let (search, mut events) = orchestrator_with(builder, transport.clone());

    let ticket = search.submit_ai_search("dragons", None).unwrap();
    assert_eq!(ticket.channel(), Channel::AiSearch);
    ticket.finished().await;

    assert_eq!(transport.call_count(), 0);
    let state = search.snapshot();
    assert_eq!(state.ai_search.status, ChannelStatus::Failed);
    assert_eq!(state.ai_search.error.as_deref(), Some("Unknown AI provider: unknown-x"));
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, SearchEvent::AiSearchError(m) if m.contains("unknown-x"))));
}

#[tokio::test(start_paused = true)]
async fn test_ai_search_unavailable_without_config() {
    let transport = Arc::new(ScriptedTransport::replying(json!({})));
    let (search, mut events) = orchestrator(settings(), transport.clone());

    assert!(!search.is_ai_enabled());
    assert!(!search.toggle_ai());
    assert!(!search.set_ai_mode(true));
    assert!(search.submit_ai_search("dragons", None).is_none());

    let message = SearchError::AiUnavailable.user_message();
    let state = search.snapshot();
    assert_eq!(state.ai_search.status, ChannelStatus::Failed);
    assert_eq!(state.ai_search.error.as_deref(), Some(message.as_str()));
    assert_eq!(drain(&mut events), vec![SearchEvent::AiSearchError(message)]);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ai_config_without_key_is_unusable() {
    let transport = Arc::new(ScriptedTransport::replying(json!({ "results": [] })));
    let builder =
        SearchOrchestratorBuilder::new(settings()).with_ai_config(AIConfig::new("openai", "  "));
    let (search, _events) = orchestrator_with(builder, transport.clone());

    assert!(!search.is_ai_enabled());
    assert!(!search.toggle_ai());
    // AI mode stays off, so a submission takes the standard path
    let ticket = search.submit_search("dragons").unwrap();
    assert_eq!(ticket.channel(), Channel::Search);
}

#[tokio::test(start_paused = true)]
async fn test_ai_mode_routes_search_to_provider() {
    let transport = Arc::new(ScriptedTransport::replying(json!({ "results": [] })));
    let builder = SearchOrchestratorBuilder::new(settings())
        .with_ai_config(AIConfig::new("custom", "key"))
        .with_providers(custom_router());
    let (search, mut events) = orchestrator_with(builder, transport.clone());

    assert!(search.is_ai_enabled());
    assert!(search.toggle_ai());
    search.set_category("monsters");

    let ticket = search.submit_search("cold dragons").unwrap();
    assert_eq!(ticket.channel(), Channel::AiSearch);
    ticket.finished().await;

    assert_eq!(transport.call_count(), 0);
    let response = search.snapshot().ai_search.data.unwrap();
    assert_eq!(response.query, "cold dragons");
    assert_eq!(response.original_query.as_deref(), Some("cold dragons"));
    assert_eq!(response.ai_generated, Some(true));
    assert_eq!(response.results[0].title, "Generated for cold dragons");
    assert_eq!(response.results[0].category.as_deref(), Some("monsters"));

    let events = drain(&mut events);
    assert!(matches!(&events[0], SearchEvent::AiSearchStarted(req) if req.query == "cold dragons"));
    assert!(matches!(&events[1], SearchEvent::AiSearch(_)));

    assert!(!search.toggle_ai());
    assert_eq!(search.submit_search("x").unwrap().channel(), Channel::Search);
}

#[tokio::test(start_paused = true)]
async fn test_ai_search_passes_context() {
    let transport = Arc::new(ScriptedTransport::replying(json!({})));
    let router = ProviderRouter::builder()
        .with_custom(|_config, request| async move {
            Ok::<_, ProviderError>(AISearchResponse {
                results: Vec::new(),
                total: None,
                query: request.query.clone(),
                message: request.context.clone(),
                ai_generated: Some(true),
                ai_explanation: None,
                original_query: None,
            })
        })
        .build();
    let builder = SearchOrchestratorBuilder::new(settings())
        .with_ai_config(AIConfig::new("custom", "key"))
        .with_providers(router);
    let (search, _events) = orchestrator_with(builder, transport);

    search
        .submit_ai_search("traps", Some("level 3 party"))
        .unwrap()
        .finished()
        .await;

    let response = search.snapshot().ai_search.data.unwrap();
    assert_eq!(response.message.as_deref(), Some("level 3 party"));
    assert!(response.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_provider_failure_is_reported() {
    let transport = Arc::new(ScriptedTransport::replying(json!({})));
    let router = ProviderRouter::builder()
        .with_custom(|_config, _request| async move {
            Err::<AISearchResponse, _>(ProviderError::Authentication("bad key".to_string()))
        })
        .build();
    let builder = SearchOrchestratorBuilder::new(settings())
        .with_ai_config(AIConfig::new("custom", "key"))
        .with_providers(router);
    let (search, mut events) = orchestrator_with(builder, transport);

    search.submit_ai_search("traps", None).unwrap().finished().await;

    let state = search.snapshot();
    assert_eq!(state.ai_search.status, ChannelStatus::Failed);
    assert_eq!(
        state.ai_search.error.as_deref(),
        Some("AI provider rejected the API key")
    );
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, SearchEvent::AiSearchError(_))));
}

#[tokio::test(start_paused = true)]
async fn test_initial_ai_mode_requires_usable_config() {
    let mut config = settings();
    config.initial_ai_mode = true;

    let transport = Arc::new(ScriptedTransport::replying(json!({})));
    let (search, _events) = orchestrator(config.clone(), transport.clone());
    assert!(!search.is_ai_mode());

    let builder = SearchOrchestratorBuilder::new(config)
        .with_ai_config(AIConfig::new("custom", "key"))
        .with_providers(custom_router());
    let (search, _events) = orchestrator_with(builder, transport);
    assert!(search.is_ai_mode());
    assert!(!search.set_ai_mode(false));
}

#[test]
fn test_build_rejects_empty_api_url() {
    let result = SearchOrchestratorBuilder::new(crate::config::SearchConfig::new("  ")).build();
    assert!(matches!(result, Err(SearchError::Config(_))));
}
