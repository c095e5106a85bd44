//! Consumer Callbacks
//!
//! `SearchEvents` is the callback surface a consumer implements to observe
//! search box activity. Every method has a no-op default. An unbounded channel
//! sender of `SearchEvent` implements the trait for consumers that prefer a
//! message stream.

use crate::core::models::{
    AISearchRequest, AISearchResponse, AutocompleteRequestData, SearchRequestData,
    SearchResponse, SearchResult, Suggestion,
};
use tokio::sync::mpsc;

pub trait SearchEvents: Send + Sync {
    fn on_search(&self, _results: &[SearchResult], _response: &SearchResponse) {}

    fn on_search_start(&self, _request: &SearchRequestData) {}

    fn on_search_error(&self, _message: &str) {}

    fn on_ai_search(&self, _results: &[SearchResult], _response: &AISearchResponse) {}

    fn on_ai_search_start(&self, _request: &AISearchRequest) {}

    fn on_ai_search_error(&self, _message: &str) {}

    fn on_suggestion_select(&self, _suggestion: &Suggestion) {}

    /// New suggestion set for `query`, fetched or republished from cache.
    fn on_suggestions(&self, _query: &str, _suggestions: &[Suggestion]) {}

    fn on_autocomplete_request(&self, _request: &AutocompleteRequestData) {}

    fn on_autocomplete_error(&self, _message: &str) {}

    fn on_suggestion_select_and_search(&self, _suggestion: &Suggestion) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl SearchEvents for NoopEvents {}

/// Owned form of each callback, for channel-based consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    SearchStarted(SearchRequestData),
    Search(SearchResponse),
    SearchError(String),
    AiSearchStarted(AISearchRequest),
    AiSearch(AISearchResponse),
    AiSearchError(String),
    SuggestionSelected(Suggestion),
    Suggestions {
        query: String,
        suggestions: Vec<Suggestion>,
    },
    AutocompleteRequested(AutocompleteRequestData),
    AutocompleteError(String),
    SuggestionSelectedAndSearch(Suggestion),
}

impl SearchEvents for mpsc::UnboundedSender<SearchEvent> {
    fn on_search(&self, _results: &[SearchResult], response: &SearchResponse) {
        let _ = self.send(SearchEvent::Search(response.clone()));
    }

    fn on_search_start(&self, request: &SearchRequestData) {
        let _ = self.send(SearchEvent::SearchStarted(request.clone()));
    }

    fn on_search_error(&self, message: &str) {
        let _ = self.send(SearchEvent::SearchError(message.to_string()));
    }

    fn on_ai_search(&self, _results: &[SearchResult], response: &AISearchResponse) {
        let _ = self.send(SearchEvent::AiSearch(response.clone()));
    }

    fn on_ai_search_start(&self, request: &AISearchRequest) {
        let _ = self.send(SearchEvent::AiSearchStarted(request.clone()));
    }

    fn on_ai_search_error(&self, message: &str) {
        let _ = self.send(SearchEvent::AiSearchError(message.to_string()));
    }

    fn on_suggestion_select(&self, suggestion: &Suggestion) {
        let _ = self.send(SearchEvent::SuggestionSelected(suggestion.clone()));
    }

    fn on_suggestions(&self, query: &str, suggestions: &[Suggestion]) {
        let _ = self.send(SearchEvent::Suggestions {
            query: query.to_string(),
            suggestions: suggestions.to_vec(),
        });
    }

    fn on_autocomplete_request(&self, request: &AutocompleteRequestData) {
        let _ = self.send(SearchEvent::AutocompleteRequested(request.clone()));
    }

    fn on_autocomplete_error(&self, message: &str) {
        let _ = self.send(SearchEvent::AutocompleteError(message.to_string()));
    }

    fn on_suggestion_select_and_search(&self, suggestion: &Suggestion) {
        let _ = self.send(SearchEvent::SuggestionSelectedAndSearch(suggestion.clone()));
    }
}
