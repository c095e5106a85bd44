//! Search Box State
//!
//! Explicit per-channel state plus the shared query/category/filter inputs.

use crate::core::lifecycle::RequestId;
use crate::core::models::{AISearchResponse, Filters, SearchResponse, Suggestion};
use serde::Serialize;

/// Per-channel request status.
///
/// `Idle -> Gated -> Pending -> {Succeeded, Failed}`; a new request from any
/// status goes straight to `Pending`, and clearing returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    #[default]
    Idle,
    Gated,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelState<T> {
    pub status: ChannelStatus,
    pub query: String,
    pub error: Option<String>,
    pub data: Option<T>,
    pub request_id: Option<RequestId>,
}

impl<T> Default for ChannelState<T> {
    fn default() -> Self {
        Self {
            status: ChannelStatus::Idle,
            query: String::new(),
            error: None,
            data: None,
            request_id: None,
        }
    }
}

impl<T> ChannelState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == ChannelStatus::Pending
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn gate(&mut self, query: &str) {
        self.status = ChannelStatus::Gated;
        self.query = query.to_string();
    }

    pub(crate) fn begin(&mut self, query: &str, id: RequestId) {
        self.status = ChannelStatus::Pending;
        self.query = query.to_string();
        self.error = None;
        self.request_id = Some(id);
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.status = ChannelStatus::Succeeded;
        self.error = None;
        self.data = Some(data);
        self.request_id = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = ChannelStatus::Failed;
        self.error = Some(message);
        self.data = None;
        self.request_id = None;
    }
}

/// Snapshot-able state of one search box.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchBoxState {
    pub query: String,
    pub category: String,
    pub filters: Filters,
    pub ai_mode: bool,
    pub autocomplete: ChannelState<Vec<Suggestion>>,
    pub search: ChannelState<SearchResponse>,
    pub ai_search: ChannelState<AISearchResponse>,
}

impl SearchBoxState {
    /// Currently displayed suggestions.
    pub fn suggestions(&self) -> &[Suggestion] {
        self.autocomplete.data.as_deref().unwrap_or(&[])
    }
}
