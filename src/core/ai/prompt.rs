//! Prompt construction and reply parsing shared by the built-in providers.

use super::ProviderError;
use crate::core::models::{AISearchRequest, AISearchResponse, SearchResult};
use serde_json::Value;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a search assistant. \
Given a user query, return the most relevant results as a single JSON object of the form \
{\"results\": [{\"id\": number, \"title\": string, \"description\": string, \"type\": string, \"url\": string}], \
\"explanation\": string}. \
Keep descriptions short. Respond with the JSON object only.";

/// User turn sent to the model.
pub fn build_user_prompt(request: &AISearchRequest) -> String {
    let mut prompt = format!("Search query: {}", request.query);

    if let Some(category) = request.category.as_deref().filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\nCategory: {}", category));
    }
    if let Some(context) = request.context.as_deref().filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\nContext: {}", context));
    }
    if let Some(filters) = request.filters.as_ref().filter(|f| !f.is_empty()) {
        prompt.push_str(&format!("\nFilters: {}", Value::Object(filters.clone())));
    }

    prompt
}

/// Extract the JSON object from a model reply, tolerating code fences and
/// surrounding prose.
fn extract_json(reply: &str) -> Option<&str> {
    let body = match reply.find("```") {
        Some(start) => {
            let after = &reply[start + 3..];
            // Skip the fence's language tag line.
            let after = after.find('\n').map_or(after, |nl| &after[nl + 1..]);
            after.find("```").map_or(after, |end| &after[..end])
        }
        None => reply,
    };

    let open = body.find('{')?;
    let close = body.rfind('}')?;
    (open < close).then(|| &body[open..=close])
}

fn parse_result(index: usize, item: &Value) -> Result<SearchResult, ProviderError> {
    let title = item
        .get("title")
        .or_else(|| item.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::malformed(format!("result {} has no title", index)))?;

    let id = match item.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(index as i64 + 1);

    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(SearchResult {
        id,
        title: title.to_string(),
        description: text("description"),
        kind: text("type").unwrap_or_else(|| "ai".to_string()),
        category: text("category"),
        url: text("url").unwrap_or_default(),
    })
}

/// Turn a model reply into an `AISearchResponse` for `request`.
pub fn parse_ai_reply(reply: &str, request: &AISearchRequest) -> Result<AISearchResponse, ProviderError> {
    let json = extract_json(reply)
        .ok_or_else(|| ProviderError::malformed("reply contains no JSON object"))?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ProviderError::malformed(format!("reply is not valid JSON: {}", e)))?;

    let items = value
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::malformed("reply has no `results` array"))?;

    let results = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_result(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AISearchResponse {
        total: Some(results.len() as u64),
        results,
        query: request.query.clone(),
        message: None,
        ai_generated: Some(true),
        ai_explanation: value
            .get("explanation")
            .and_then(Value::as_str)
            .map(str::to_string),
        original_query: Some(request.query.clone()),
    })
}
