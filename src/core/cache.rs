//! Suggestion Cache
//!
//! Last-known-good suggestion set per `(category, query)`. Entries never
//! expire and are replaced wholesale by newer successful fetches.

use crate::core::models::Suggestion;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Cache key: category plus normalized (trimmed, lowercased) query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub category: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(category: &str, query: &str) -> Self {
        Self {
            category: category.trim().to_string(),
            query: normalize_query(query),
        }
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// A successful suggestion fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub suggestions: Vec<Suggestion>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(suggestions: Vec<Suggestion>) -> Self {
        Self {
            suggestions,
            fetched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Replace the entry for `key`, returning the previous one.
    pub fn put(&mut self, key: CacheKey, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
