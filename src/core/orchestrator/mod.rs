//! Search Orchestrator
//!
//! Composes transport, transforms, cache, debounce, lifecycle and the AI
//! provider router into the three search box flows:
//!
//! - autocomplete as the user types (debounced, cached, gated on
//!   `min_query_length`)
//! - explicit search submission
//! - AI-augmented search through the provider router
//!
//! Each flow owns one channel. At most one request per channel is current;
//! outcomes of superseded requests are discarded. Every failure is converted
//! into a user-facing message stored in channel state and reported through
//! `SearchEvents`; nothing escapes to the caller.
//!
//! Lock order is lifecycle, then state, then cache. Callbacks run with no
//! lock held.

mod events;
mod state;

pub use events::{NoopEvents, SearchEvent, SearchEvents};
pub use state::{ChannelState, ChannelStatus, SearchBoxState};

use crate::config::{AppConfig, ConfigError, SearchConfig};
use crate::core::ai::{AIConfig, ProviderRouter};
use crate::core::cache::{CacheEntry, CacheKey, SuggestionCache};
use crate::core::debounce::DebounceScheduler;
use crate::core::error::{Result, SearchError};
use crate::core::lifecycle::{Channel, RequestHandle, RequestId, RequestLifecycle};
use crate::core::models::{
    AISearchRequest, AISearchResponse, AutocompleteRequestData, AutocompleteResponse, Filters,
    SearchCategory, SearchRequestData, SearchResponse, Suggestion,
};
use crate::core::transform::{NormalizeResponse, TransformError, Transforms};
use crate::core::transport::{
    HttpMethod, HttpTransport, ReqwestTransport, RequestConfig, TransportRequest,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

// ============================================================================
// Public Types
// ============================================================================

/// What `handle_input_change` did with the new query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Autocomplete is turned off in settings.
    Disabled,
    /// Query shorter than `min_query_length`; suggestions cleared.
    BelowThreshold,
    /// An autocomplete request will fire after the debounce delay.
    Scheduled,
}

/// Handle to an explicitly issued request.
#[derive(Debug)]
pub struct RequestTicket {
    channel: Channel,
    id: RequestId,
    task: JoinHandle<()>,
}

impl RequestTicket {
    fn spawn<F>(handle: &RequestHandle, flow: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            channel: handle.channel,
            id: handle.id,
            task: tokio::spawn(flow),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait until the request's outcome has been applied (or discarded).
    pub async fn finished(self) {
        if let Err(err) = self.task.await {
            if err.is_panic() {
                log::error!("{} request {} panicked: {}", self.channel, self.id, err);
            }
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Request orchestration for one search box. Cheap to clone; clones share
/// state.
#[derive(Clone)]
pub struct SearchOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    settings: SearchConfig,
    request_config: RequestConfig,
    ai_config: Option<AIConfig>,
    transport: Arc<dyn HttpTransport>,
    transforms: Transforms,
    providers: ProviderRouter,
    events: Arc<dyn SearchEvents>,
    cache: Mutex<SuggestionCache>,
    debounce: DebounceScheduler<Channel>,
    lifecycle: RequestLifecycle,
    state: Mutex<SearchBoxState>,
}

fn query_len(query: &str) -> usize {
    query.trim().chars().count()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn non_empty_filters(filters: Filters) -> Option<Filters> {
    (!filters.is_empty()).then_some(filters)
}

impl SearchOrchestrator {
    pub fn builder(settings: SearchConfig) -> SearchOrchestratorBuilder {
        SearchOrchestratorBuilder::new(settings)
    }

    // ── Autocomplete ────────────────────────────────────────────────────────

    /// Record a query change and schedule a debounced autocomplete request.
    pub fn handle_input_change(&self, query: &str) -> InputOutcome {
        let inner = &self.inner;
        inner.state.lock().query = query.to_string();

        if !inner.settings.autocomplete {
            return InputOutcome::Disabled;
        }

        if query_len(query) < inner.settings.min_query_length {
            inner.clear_autocomplete();
            return InputOutcome::BelowThreshold;
        }

        inner.state.lock().autocomplete.gate(query);

        let weak = Arc::downgrade(inner);
        let query = query.to_string();
        inner
            .debounce
            .schedule(Channel::Autocomplete, inner.settings.debounce(), move || async move {
                if let Some(inner) = weak.upgrade() {
                    let (handle, context) = inner.begin_autocomplete(&query);
                    inner.run_autocomplete(handle, context).await;
                }
            });

        InputOutcome::Scheduled
    }

    /// Fetch suggestions now, bypassing the debounce delay.
    pub fn fetch_suggestions(&self, query: &str) -> Option<RequestTicket> {
        let inner = &self.inner;
        inner.state.lock().query = query.to_string();
        inner.debounce.cancel(&Channel::Autocomplete);

        if query_len(query) < inner.settings.min_query_length {
            inner.clear_autocomplete();
            return None;
        }

        let (handle, context) = inner.begin_autocomplete(query);
        let flow = Arc::clone(inner).run_autocomplete(handle.clone(), context);
        Some(RequestTicket::spawn(&handle, flow))
    }

    /// Republish the cached suggestions for `query` without network traffic.
    pub fn show_cached(&self, query: &str) -> Option<Vec<Suggestion>> {
        let inner = &self.inner;
        let category = inner.state.lock().category.clone();
        let suggestions = inner
            .cache
            .lock()
            .get(&CacheKey::new(&category, query))
            .map(|entry| entry.suggestions.clone())?;

        {
            let mut state = inner.state.lock();
            state.autocomplete.query = query.to_string();
            state.autocomplete.succeed(suggestions.clone());
        }

        log::debug!("Showing {} cached suggestions for {:?}", suggestions.len(), query);
        inner.events.on_suggestions(query, &suggestions);
        Some(suggestions)
    }

    /// Focus regained: show cached suggestions for the current query.
    pub fn handle_input_focus(&self) -> Option<Vec<Suggestion>> {
        let query = self.inner.state.lock().query.clone();
        if query_len(&query) < self.inner.settings.min_query_length {
            return None;
        }
        self.show_cached(&query)
    }

    pub fn clear_suggestions(&self) {
        self.inner.clear_autocomplete();
    }

    pub fn select_suggestion(&self, suggestion: &Suggestion) {
        let inner = &self.inner;
        inner.state.lock().query = suggestion.text.clone();
        inner.clear_autocomplete();
        inner.events.on_suggestion_select(suggestion);
    }

    pub fn select_suggestion_and_search(&self, suggestion: &Suggestion) -> Option<RequestTicket> {
        self.select_suggestion(suggestion);
        self.inner.events.on_suggestion_select_and_search(suggestion);
        self.submit_search(&suggestion.text)
    }

    // ── Search ──────────────────────────────────────────────────────────────

    /// Submit an explicit search. Routed to AI search when AI mode is on and
    /// AI search is usable. Returns `None` when the query is below
    /// `min_search_length`.
    pub fn submit_search(&self, query: &str) -> Option<RequestTicket> {
        let inner = &self.inner;
        let (ai_mode, category, filters) = {
            let mut state = inner.state.lock();
            state.query = query.to_string();
            (state.ai_mode, state.category.clone(), state.filters.clone())
        };

        if ai_mode {
            if inner.ai_usable() {
                return self.submit_ai_search(query, None);
            }
            log::warn!("AI mode is on but AI search is unavailable; using standard search");
        }

        inner.clear_autocomplete();

        if query_len(query) < inner.settings.min_search_length {
            inner
                .lifecycle
                .invalidate_with(Channel::Search, || inner.state.lock().search.reset());
            return None;
        }

        let context = SearchRequestData::new(query)
            .with_category(non_empty(&category))
            .with_filters(non_empty_filters(filters));

        let (handle, ()) = inner
            .lifecycle
            .begin_with(Channel::Search, |id| inner.state.lock().search.begin(query, id));
        log::info!("Search request {} for {:?}", handle.id, query);
        inner.events.on_search_start(&context);

        let flow = Arc::clone(inner).run_search(handle.clone(), context);
        Some(RequestTicket::spawn(&handle, flow))
    }

    /// Submit an AI-augmented search. When AI search is disabled or has no
    /// key the AI channel records the failure and `None` is returned.
    pub fn submit_ai_search(&self, query: &str, context: Option<&str>) -> Option<RequestTicket> {
        let inner = &self.inner;
        let (category, filters) = {
            let mut state = inner.state.lock();
            state.query = query.to_string();
            (state.category.clone(), state.filters.clone())
        };

        let config = match inner.ai_config.as_ref().filter(|c| c.is_usable()) {
            Some(config) => config.clone(),
            None => {
                let message = SearchError::AiUnavailable.user_message();
                log::warn!("{}", message);
                inner.lifecycle.invalidate_with(Channel::AiSearch, || {
                    inner.state.lock().ai_search.fail(message.clone())
                });
                inner.events.on_ai_search_error(&message);
                return None;
            }
        };

        inner.clear_autocomplete();

        if query_len(query) < inner.settings.min_search_length {
            inner
                .lifecycle
                .invalidate_with(Channel::AiSearch, || inner.state.lock().ai_search.reset());
            return None;
        }

        let request = AISearchRequest::new(query)
            .with_context(context.and_then(non_empty))
            .with_category(non_empty(&category))
            .with_filters(non_empty_filters(filters));

        let (handle, ()) = inner
            .lifecycle
            .begin_with(Channel::AiSearch, |id| inner.state.lock().ai_search.begin(query, id));
        log::info!(
            "AI search request {} for {:?} via {}",
            handle.id,
            query,
            config.provider_id()
        );
        inner.events.on_ai_search_start(&request);

        let flow = Arc::clone(inner).run_ai_search(handle.clone(), config, request);
        Some(RequestTicket::spawn(&handle, flow))
    }

    pub fn clear_results(&self) {
        let inner = &self.inner;
        inner
            .lifecycle
            .invalidate_with(Channel::Search, || inner.state.lock().search.reset());
    }

    pub fn clear_ai_results(&self) {
        let inner = &self.inner;
        inner
            .lifecycle
            .invalidate_with(Channel::AiSearch, || inner.state.lock().ai_search.reset());
    }

    // ── Modes and scope ─────────────────────────────────────────────────────

    /// Flip AI mode. Stays off while AI search is unusable.
    pub fn toggle_ai(&self) -> bool {
        let enabled = self.inner.ai_usable();
        let mut state = self.inner.state.lock();
        state.ai_mode = enabled && !state.ai_mode;
        state.ai_mode
    }

    pub fn set_ai_mode(&self, on: bool) -> bool {
        let enabled = self.inner.ai_usable();
        let mut state = self.inner.state.lock();
        state.ai_mode = on && enabled;
        state.ai_mode
    }

    /// AI search is enabled and keyed.
    pub fn is_ai_enabled(&self) -> bool {
        self.inner.ai_usable()
    }

    pub fn is_ai_mode(&self) -> bool {
        self.inner.state.lock().ai_mode
    }

    /// Change the search scope. Suggestions of the previous scope are cleared.
    pub fn set_category(&self, category: &str) {
        self.inner.state.lock().category = category.trim().to_string();
        self.inner.clear_autocomplete();
    }

    pub fn set_filters(&self, filters: Filters) {
        self.inner.state.lock().filters = filters;
    }

    pub fn categories(&self) -> &[SearchCategory] {
        &self.inner.settings.categories
    }

    pub fn settings(&self) -> &SearchConfig {
        &self.inner.settings
    }

    // ── Inspection and teardown ─────────────────────────────────────────────

    pub fn snapshot(&self) -> SearchBoxState {
        self.inner.state.lock().clone()
    }

    pub fn cached(&self, category: &str, query: &str) -> Option<CacheEntry> {
        self.inner
            .cache
            .lock()
            .get(&CacheKey::new(category, query))
            .cloned()
    }

    /// Cancel everything pending and drop cached suggestions.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        inner.debounce.cancel_all();
        inner.lifecycle.cancel_all();
        {
            let mut state = inner.state.lock();
            state.autocomplete.reset();
            state.search.reset();
            state.ai_search.reset();
        }
        inner.cache.lock().clear();
        log::info!("Search orchestrator shut down");
    }
}

impl fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("settings", &self.inner.settings)
            .field("ai_config", &self.inner.ai_config)
            .field("providers", &self.inner.providers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Flows
// ============================================================================

impl Inner {
    fn ai_usable(&self) -> bool {
        self.ai_config.as_ref().is_some_and(AIConfig::is_usable)
    }

    /// Drop pending and in-flight autocomplete work and clear suggestions.
    fn clear_autocomplete(&self) {
        self.debounce.cancel(&Channel::Autocomplete);
        self.lifecycle
            .invalidate_with(Channel::Autocomplete, || self.state.lock().autocomplete.reset());
    }

    fn build_request(&self, url: &str, payload: Value, handle: &RequestHandle) -> TransportRequest {
        let method = self.request_config.method.unwrap_or(HttpMethod::Post);
        let request = TransportRequest::new(url)
            .with_method(method)
            .with_config(self.request_config.clone())
            .with_signal(handle.signal());

        if method.sends_body() {
            request.with_data(payload)
        } else {
            request.with_params_from(&payload)
        }
    }

    fn begin_autocomplete(&self, query: &str) -> (RequestHandle, AutocompleteRequestData) {
        let category = self.state.lock().category.clone();
        let context = AutocompleteRequestData::new(query, non_empty(&category));

        let (handle, ()) = self.lifecycle.begin_with(Channel::Autocomplete, |id| {
            self.state.lock().autocomplete.begin(query, id)
        });
        log::debug!("Autocomplete request {} for {:?}", handle.id, query);
        self.events.on_autocomplete_request(&context);

        (handle, context)
    }

    async fn run_autocomplete(self: Arc<Self>, handle: RequestHandle, context: AutocompleteRequestData) {
        let signal = handle.signal();
        let result = tokio::select! {
            biased;
            _ = signal.cancelled() => Err(SearchError::Cancelled),
            result = self.fetch_autocomplete(&context, &handle) => result,
        };

        match result {
            Ok(response) => {
                let key = CacheKey::new(context.category.as_deref().unwrap_or_default(), &context.query);
                let suggestions = response.suggestions;

                let applied = self.lifecycle.complete(Channel::Autocomplete, handle.id, || {
                    self.state.lock().autocomplete.succeed(suggestions.clone());
                    self.cache.lock().put(key, CacheEntry::new(suggestions.clone()));
                });

                if applied.is_some() {
                    log::debug!(
                        "Autocomplete request {} returned {} suggestions",
                        handle.id,
                        suggestions.len()
                    );
                    self.events.on_suggestions(&context.query, &suggestions);
                }
            }
            Err(err) => self.fail(Channel::Autocomplete, handle.id, err),
        }
    }

    async fn fetch_autocomplete(
        &self,
        context: &AutocompleteRequestData,
        handle: &RequestHandle,
    ) -> Result<AutocompleteResponse> {
        let payload = self.transforms.autocomplete.to_request(context)?;
        let request = self.build_request(self.settings.autocomplete_endpoint(), payload, handle);
        let response = self.transport.request(request).await?;

        let mut parsed = self.transforms.autocomplete.from_response(response.data)?;
        backfill_query(&mut parsed, &context.query, Channel::Autocomplete);
        Ok(parsed)
    }

    async fn run_search(self: Arc<Self>, handle: RequestHandle, context: SearchRequestData) {
        let signal = handle.signal();
        let result = tokio::select! {
            biased;
            _ = signal.cancelled() => Err(SearchError::Cancelled),
            result = self.fetch_search(&context, &handle) => result,
        };

        match result {
            Ok(response) => {
                let applied = self.lifecycle.complete(Channel::Search, handle.id, || {
                    self.state.lock().search.succeed(response.clone())
                });

                if applied.is_some() {
                    log::info!(
                        "Search request {} returned {} of {} results",
                        handle.id,
                        response.results.len(),
                        response.total_or_len()
                    );
                    self.events.on_search(&response.results, &response);
                }
            }
            Err(err) => self.fail(Channel::Search, handle.id, err),
        }
    }

    async fn fetch_search(
        &self,
        context: &SearchRequestData,
        handle: &RequestHandle,
    ) -> Result<SearchResponse> {
        let payload = self.transforms.search.to_request(context)?;
        let request = self.build_request(&self.settings.api_url, payload, handle);
        let response = self.transport.request(request).await?;

        let mut parsed = self.transforms.search.from_response(response.data)?;
        backfill_query(&mut parsed, &context.query, Channel::Search);
        Ok(parsed)
    }

    async fn run_ai_search(
        self: Arc<Self>,
        handle: RequestHandle,
        config: AIConfig,
        request: AISearchRequest,
    ) {
        let signal = handle.signal();
        let result = tokio::select! {
            biased;
            _ = signal.cancelled() => Err(SearchError::Cancelled),
            result = self.fetch_ai_search(&config, &request) => result,
        };

        match result {
            Ok(response) => {
                let applied = self.lifecycle.complete(Channel::AiSearch, handle.id, || {
                    self.state.lock().ai_search.succeed(response.clone())
                });

                if applied.is_some() {
                    log::info!(
                        "AI search request {} returned {} results",
                        handle.id,
                        response.results.len()
                    );
                    self.events.on_ai_search(&response.results, &response);
                }
            }
            Err(err) => self.fail(Channel::AiSearch, handle.id, err),
        }
    }

    async fn fetch_ai_search(
        &self,
        config: &AIConfig,
        request: &AISearchRequest,
    ) -> Result<AISearchResponse> {
        // Resolved first: an unknown provider never reaches the transport.
        let provider = self.providers.resolve(&config.provider)?;

        let payload = self.transforms.ai_search.to_request(request)?;
        let shaped: AISearchRequest = serde_json::from_value(payload).map_err(TransformError::from)?;

        let response = provider.search(config, &shaped).await?;

        let raw = serde_json::to_value(&response).map_err(TransformError::from)?;
        let mut parsed = self.transforms.ai_search.from_response(raw)?;
        backfill_query(&mut parsed, &request.query, Channel::AiSearch);
        if parsed.original_query.is_none() {
            parsed.original_query = Some(request.query.clone());
        }
        Ok(parsed)
    }

    /// Record a failed request if it is still current and report it.
    /// Cancellations only retire the request.
    fn fail(&self, channel: Channel, id: RequestId, err: SearchError) {
        if err.is_cancelled() {
            log::debug!("{} request {} cancelled", channel, id);
            self.lifecycle.complete(channel, id, || {
                let mut state = self.state.lock();
                match channel {
                    Channel::Autocomplete => state.autocomplete.reset(),
                    Channel::Search => state.search.reset(),
                    Channel::AiSearch => state.ai_search.reset(),
                }
            });
            return;
        }

        let message = err.user_message();
        let applied = self.lifecycle.complete(channel, id, || {
            let mut state = self.state.lock();
            match channel {
                Channel::Autocomplete => state.autocomplete.fail(message.clone()),
                Channel::Search => state.search.fail(message.clone()),
                Channel::AiSearch => state.ai_search.fail(message.clone()),
            }
        });

        if applied.is_none() {
            return;
        }

        log::warn!("{} request {} failed: {}", channel, id, err);
        match channel {
            Channel::Autocomplete => self.events.on_autocomplete_error(&message),
            Channel::Search => self.events.on_search_error(&message),
            Channel::AiSearch => self.events.on_ai_search_error(&message),
        }
    }
}

/// Fill in a missing query echo; a differing echo is kept as sent.
fn backfill_query<R: NormalizeResponse>(response: &mut R, query: &str, channel: Channel) {
    if response.query().is_empty() {
        response.set_query(query.to_string());
    } else if response.query() != query {
        log::debug!(
            "{} response echoes {:?} for query {:?}",
            channel,
            response.query(),
            query
        );
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing a SearchOrchestrator
pub struct SearchOrchestratorBuilder {
    settings: SearchConfig,
    request_config: RequestConfig,
    ai_config: Option<AIConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    transforms: Transforms,
    providers: Option<ProviderRouter>,
    events: Arc<dyn SearchEvents>,
}

impl SearchOrchestratorBuilder {
    pub fn new(settings: SearchConfig) -> Self {
        Self {
            settings,
            request_config: RequestConfig::default(),
            ai_config: None,
            transport: None,
            transforms: Transforms::default(),
            providers: None,
            events: Arc::new(NoopEvents),
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        let builder = Self::new(config.search.clone()).with_request_config(config.request.clone());
        match &config.ai {
            Some(ai) => builder.with_ai_config(ai.clone()),
            None => builder,
        }
    }

    pub fn with_request_config(mut self, config: RequestConfig) -> Self {
        self.request_config = config;
        self
    }

    pub fn with_ai_config(mut self, config: AIConfig) -> Self {
        self.ai_config = Some(config);
        self
    }

    /// Use an injected transport for search and autocomplete requests.
    /// Built-in AI providers keep their own client.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_transforms(mut self, transforms: Transforms) -> Self {
        self.transforms = transforms;
        self
    }

    /// Replace the default registry (built-in providers over a plain
    /// reqwest client).
    pub fn with_providers(mut self, providers: ProviderRouter) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn SearchEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn build(self) -> Result<SearchOrchestrator> {
        if self.settings.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("search.api_url is empty".to_string()).into());
        }

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_config(self.request_config.clone())?),
        };
        // Vendor calls never go through the search transport: its base URL,
        // default headers and session token belong to the search backend.
        let providers = match self.providers {
            Some(providers) => providers,
            None => ProviderRouter::with_builtin(Arc::new(ReqwestTransport::new()?)),
        };

        let ai_mode =
            self.settings.initial_ai_mode && self.ai_config.as_ref().is_some_and(AIConfig::is_usable);
        let state = SearchBoxState {
            category: self.settings.category.trim().to_string(),
            ai_mode,
            ..Default::default()
        };

        Ok(SearchOrchestrator {
            inner: Arc::new(Inner {
                settings: self.settings,
                request_config: self.request_config,
                ai_config: self.ai_config,
                transport,
                transforms: self.transforms,
                providers,
                events: self.events,
                cache: Mutex::new(SuggestionCache::new()),
                debounce: DebounceScheduler::new(),
                lifecycle: RequestLifecycle::new(),
                state: Mutex::new(state),
            }),
        })
    }
}
