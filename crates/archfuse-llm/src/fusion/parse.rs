use serde_json::{Map, Value};

use crate::OracleError;

/// Extract JSON from text that may be wrapped in markdown code fences.
pub(crate) fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }
    trimmed
}

/// Parse oracle text as a single JSON object.
pub(crate) fn parse_object(text: &str) -> Result<Map<String, Value>, OracleError> {
    let value: Value = serde_json::from_str(extract_json(text))
        .map_err(|e| OracleError::NotJson(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(OracleError::NotObject("array")),
        Value::String(_) => Err(OracleError::NotObject("string")),
        Value::Number(_) => Err(OracleError::NotObject("number")),
        Value::Bool(_) => Err(OracleError::NotObject("boolean")),
        Value::Null => Err(OracleError::NotObject("null")),
    }
}

/// Cut `text` to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
