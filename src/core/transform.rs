//! Request/Response Transform Pipeline
//!
//! Pure, synchronous hooks that shape outgoing payloads and normalize
//! incoming responses. Each channel (search, autocomplete, AI search) owns a
//! pipeline; unset hooks behave as identity.
//!
//! Incoming payloads are always normalized into the canonical response type
//! with explicit validation, so a backend may answer with `results`,
//! `suggestions` or a bare array.

use crate::core::models::{
    AISearchRequest, AISearchResponse, AutocompleteRequestData, AutocompleteResponse,
    SearchRequestData, SearchResponse, SearchResult, Suggestion,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected {expected}, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Missing field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid item at index {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("Transform hook failed: {0}")]
    Hook(String),
}

impl TransformError {
    pub fn hook(message: impl Into<String>) -> Self {
        TransformError::Hook(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;

// ============================================================================
// Pipeline
// ============================================================================

/// Outgoing hook: request context to wire payload.
pub type RequestHook<C> = Arc<dyn Fn(&C) -> Result<Value> + Send + Sync>;

/// Incoming hook: raw body to a body the canonical normalizer accepts.
pub type ResponseHook = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Transform pair for one channel.
pub struct TransformPipeline<C, R> {
    request: Option<RequestHook<C>>,
    response: Option<ResponseHook>,
    _response: PhantomData<fn() -> R>,
}

impl<C, R> TransformPipeline<C, R>
where
    C: Serialize,
    R: NormalizeResponse,
{
    pub fn new() -> Self {
        Self {
            request: None,
            response: None,
            _response: PhantomData,
        }
    }

    pub fn with_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&C) -> Result<Value> + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(hook));
        self
    }

    pub fn with_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(hook));
        self
    }

    /// Shape the outgoing payload. Without a hook the context is sent as-is.
    pub fn to_request(&self, context: &C) -> Result<Value> {
        match &self.request {
            Some(hook) => hook(context),
            None => Ok(serde_json::to_value(context)?),
        }
    }

    /// Reshape and validate an incoming body.
    pub fn from_response(&self, raw: Value) -> Result<R> {
        let shaped = match &self.response {
            Some(hook) => hook(raw)?,
            None => raw,
        };
        R::normalize(shaped)
    }

    pub fn has_request_hook(&self) -> bool {
        self.request.is_some()
    }

    pub fn has_response_hook(&self) -> bool {
        self.response.is_some()
    }
}

impl<C, R> Clone for TransformPipeline<C, R> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            response: self.response.clone(),
            _response: PhantomData,
        }
    }
}

impl<C, R> Default for TransformPipeline<C, R>
where
    C: Serialize,
    R: NormalizeResponse,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> fmt::Debug for TransformPipeline<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("request_hook", &self.request.is_some())
            .field("response_hook", &self.response.is_some())
            .finish()
    }
}

/// The three per-channel pipelines.
#[derive(Debug, Clone, Default)]
pub struct Transforms {
    pub search: TransformPipeline<SearchRequestData, SearchResponse>,
    pub autocomplete: TransformPipeline<AutocompleteRequestData, AutocompleteResponse>,
    pub ai_search: TransformPipeline<AISearchRequest, AISearchResponse>,
}

impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(
        mut self,
        pipeline: TransformPipeline<SearchRequestData, SearchResponse>,
    ) -> Self {
        self.search = pipeline;
        self
    }

    pub fn with_autocomplete(
        mut self,
        pipeline: TransformPipeline<AutocompleteRequestData, AutocompleteResponse>,
    ) -> Self {
        self.autocomplete = pipeline;
        self
    }

    pub fn with_ai_search(
        mut self,
        pipeline: TransformPipeline<AISearchRequest, AISearchResponse>,
    ) -> Self {
        self.ai_search = pipeline;
        self
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Canonical response types built from arbitrary backend JSON.
pub trait NormalizeResponse: Sized {
    fn normalize(raw: Value) -> Result<Self>;

    /// Query echo, back-filled by the caller when the backend omitted it.
    fn query(&self) -> &str;

    fn set_query(&mut self, query: String);
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Split a body into its item list and the envelope around it.
fn split_envelope(
    raw: Value,
    keys: &[&'static str],
    expected: &'static str,
) -> Result<(Vec<Value>, Map<String, Value>)> {
    match raw {
        Value::Array(items) => Ok((items, Map::new())),
        Value::Object(mut envelope) => {
            for key in keys {
                match envelope.remove(*key) {
                    Some(Value::Array(items)) => return Ok((items, envelope)),
                    Some(Value::Null) | None => continue,
                    Some(other) => {
                        return Err(TransformError::UnexpectedShape {
                            expected: "array",
                            found: shape_of(&other),
                        })
                    }
                }
            }
            Err(TransformError::MissingField(keys[0]))
        }
        other => Err(TransformError::UnexpectedShape {
            expected,
            found: shape_of(&other),
        }),
    }
}

fn string_field(envelope: &Map<String, Value>, key: &str) -> Option<String> {
    envelope.get(key).and_then(Value::as_str).map(str::to_string)
}

fn normalize_suggestion(index: usize, item: Value) -> Result<Suggestion> {
    let mut fields = match item {
        Value::String(text) => {
            return Ok(Suggestion::new(index as i64 + 1, text));
        }
        Value::Object(fields) => fields,
        other => {
            return Err(TransformError::InvalidItem {
                index,
                reason: format!("expected object, got {}", shape_of(&other)),
            })
        }
    };

    if !fields.contains_key("text") {
        match fields.get("title").cloned() {
            Some(title @ Value::String(_)) => {
                fields.insert("text".to_string(), title);
            }
            _ => {
                return Err(TransformError::InvalidItem {
                    index,
                    reason: "missing `text`".to_string(),
                })
            }
        }
    }
    if fields.get("id").map_or(true, Value::is_null) {
        fields.insert("id".to_string(), Value::from(index as i64 + 1));
    }

    serde_json::from_value(Value::Object(fields)).map_err(|e| TransformError::InvalidItem {
        index,
        reason: e.to_string(),
    })
}

fn normalize_result(index: usize, item: Value) -> Result<SearchResult> {
    let mut fields = match item {
        Value::Object(fields) => fields,
        other => {
            return Err(TransformError::InvalidItem {
                index,
                reason: format!("expected object, got {}", shape_of(&other)),
            })
        }
    };

    let id = match fields.get("id") {
        None | Some(Value::Null) => index as i64 + 1,
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| TransformError::InvalidItem {
            index,
            reason: format!("id {} is not an integer", n),
        })?,
        Some(Value::String(s)) => s.trim().parse().map_err(|_| TransformError::InvalidItem {
            index,
            reason: format!("id {:?} is not an integer", s),
        })?,
        Some(other) => {
            return Err(TransformError::InvalidItem {
                index,
                reason: format!("id is a {}", shape_of(other)),
            })
        }
    };
    fields.insert("id".to_string(), Value::from(id));

    if !fields.contains_key("title") {
        match fields.get("text").cloned() {
            Some(text @ Value::String(_)) => {
                fields.insert("title".to_string(), text);
            }
            _ => {
                return Err(TransformError::InvalidItem {
                    index,
                    reason: "missing `title`".to_string(),
                })
            }
        }
    }

    serde_json::from_value(Value::Object(fields)).map_err(|e| TransformError::InvalidItem {
        index,
        reason: e.to_string(),
    })
}

fn normalize_results(items: Vec<Value>) -> Result<Vec<SearchResult>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| normalize_result(index, item))
        .collect()
}

impl NormalizeResponse for AutocompleteResponse {
    fn normalize(raw: Value) -> Result<Self> {
        let (items, envelope) = split_envelope(raw, &["suggestions", "results"], "object or array")?;
        let suggestions = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| normalize_suggestion(index, item))
            .collect::<Result<Vec<_>>>()?;

        Ok(AutocompleteResponse {
            suggestions,
            query: string_field(&envelope, "query").unwrap_or_default(),
        })
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn set_query(&mut self, query: String) {
        self.query = query;
    }
}

impl NormalizeResponse for SearchResponse {
    fn normalize(raw: Value) -> Result<Self> {
        let (items, envelope) = split_envelope(raw, &["results", "suggestions"], "object or array")?;

        Ok(SearchResponse {
            results: normalize_results(items)?,
            total: envelope.get("total").and_then(Value::as_u64),
            query: string_field(&envelope, "query").unwrap_or_default(),
            message: string_field(&envelope, "message"),
        })
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn set_query(&mut self, query: String) {
        self.query = query;
    }
}

impl NormalizeResponse for AISearchResponse {
    fn normalize(raw: Value) -> Result<Self> {
        let (items, envelope) = split_envelope(raw, &["results", "suggestions"], "object or array")?;

        Ok(AISearchResponse {
            results: normalize_results(items)?,
            total: envelope.get("total").and_then(Value::as_u64),
            query: string_field(&envelope, "query").unwrap_or_default(),
            message: string_field(&envelope, "message"),
            ai_generated: envelope.get("aiGenerated").and_then(Value::as_bool),
            ai_explanation: string_field(&envelope, "aiExplanation")
                .or_else(|| string_field(&envelope, "explanation")),
            original_query: string_field(&envelope, "originalQuery"),
        })
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn set_query(&mut self, query: String) {
        self.query = query;
    }
}
