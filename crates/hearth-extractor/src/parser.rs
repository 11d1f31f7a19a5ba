//! Parse model replies into candidate filter lists

use crate::error::ExtractorError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::warn;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("static regex"));

/// Content of the first fenced code block in `text`, if any
pub fn fenced_block(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse a free-text reply as a JSON object
///
/// The object is taken from the first fenced block when there is one,
/// otherwise from the whole reply.
pub fn parse_reply_object(reply: &str) -> Result<Map<String, Value>, ExtractorError> {
    let body = fenced_block(reply).unwrap_or_else(|| reply.trim());

    match serde_json::from_str::<Value>(body)? {
        Value::Object(object) => Ok(object),
        other => Err(ExtractorError::ModelOutput(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Parse the first fenced block of a reply as a bare array of filters
///
/// `None` unless the block holds an array or an `items` envelope.
pub fn parse_fenced_filters(reply: &str) -> Option<Vec<Value>> {
    let block = fenced_block(reply)?;
    match serde_json::from_str::<Value>(block) {
        Ok(Value::Array(items)) => Some(items),
        Ok(Value::Object(mut envelope))
            if envelope.get("type").and_then(Value::as_str) == Some("array") =>
        {
            match envelope.remove("items") {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }
        }
        Ok(other) => {
            warn!("Fenced block holds {}, not a filter list", json_kind(&other));
            None
        }
        Err(e) => {
            warn!("Fenced block is not JSON: {}", e);
            None
        }
    }
}

/// Normalize the `filters` member of a reply into a candidate list
///
/// Accepts a bare array or a schema-style `{"type": "array", "items": [...]}`
/// envelope. Anything else yields no candidates.
pub fn candidate_list(filters: Value) -> Vec<Value> {
    match filters {
        Value::Array(items) => items,
        Value::Object(mut envelope)
            if envelope.get("type").and_then(Value::as_str) == Some("array") =>
        {
            match envelope.remove("items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        Value::Null => Vec::new(),
        other => {
            warn!("Ignoring filters of unexpected shape: {}", json_kind(&other));
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_object() {
        let reply = r#"{"filters": [], "search_name": "Homes"}"#;
        let object = parse_reply_object(reply).unwrap();
        assert_eq!(object["search_name"], "Homes");
    }

    #[test]
    fn test_parse_object_with_markdown_wrapper() {
        let reply = "Here you go:\n```json\n{\"filters\": [{\"id\": 1}]}\n```\nAnything else?";
        let object = parse_reply_object(reply).unwrap();
        assert_eq!(object["filters"][0]["id"], 1);
    }

    #[test]
    fn test_parse_object_without_language_tag() {
        let reply = "```\n{\"explanation\": {\"matched\": \"x\"}}\n```";
        assert!(parse_reply_object(reply).is_ok());
    }

    #[test]
    fn test_parse_object_rejects_array_and_prose() {
        assert!(matches!(
            parse_reply_object("[1, 2]"),
            Err(ExtractorError::ModelOutput(_))
        ));
        assert!(matches!(
            parse_reply_object("I could not find any filters."),
            Err(ExtractorError::JsonParse(_))
        ));
    }

    #[test]
    fn test_fenced_filters_bare_array() {
        let reply = "Filters:\n```json\n[{\"id\": 3}, {\"id\": 4}]\n```";
        let filters = parse_fenced_filters(reply).unwrap();
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn test_fenced_filters_missing_or_invalid() {
        assert!(parse_fenced_filters("no code here").is_none());
        assert!(parse_fenced_filters("```\nnot json\n```").is_none());
    }

    #[test]
    fn test_fenced_filters_require_a_list() {
        assert!(parse_fenced_filters("```json\n5\n```").is_none());
        assert!(parse_fenced_filters("```json\n\"none\"\n```").is_none());
        assert!(parse_fenced_filters("```json\n{\"id\": 1}\n```").is_none());
        assert!(parse_fenced_filters("```json\n{\"type\": \"array\"}\n```").is_none());

        let envelope = "```json\n{\"type\": \"array\", \"items\": [{\"id\": 1}]}\n```";
        assert_eq!(parse_fenced_filters(envelope).unwrap().len(), 1);
        assert!(parse_fenced_filters("```json\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn test_items_envelope_unwrapped() {
        let envelope = json!({"type": "array", "items": [{"id": 1}, {"id": 2}]});
        assert_eq!(candidate_list(envelope).len(), 2);
    }

    #[test]
    fn test_unexpected_filter_shapes_yield_nothing() {
        assert!(candidate_list(json!({"id": 1})).is_empty());
        assert!(candidate_list(json!("filters")).is_empty());
        assert!(candidate_list(Value::Null).is_empty());
    }

    #[test]
    fn test_first_fenced_block_wins() {
        let reply = "```json\n[1]\n```\nand\n```json\n[2]\n```";
        assert_eq!(fenced_block(reply), Some("[1]"));
    }
}
