//! Request and response types for extraction

use crate::error::ExtractorError;
use hearth_domain::{FilterInstance, SourceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to extract filters from a natural-language prompt
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// User prompt; may be empty when only naming applied filters
    pub prompt: String,

    /// Filters already applied by the caller (empty for a fresh search)
    pub applied_filters: Vec<FilterInstance>,

    /// Dataset being searched
    pub source_type: SourceType,
}

impl ExtractionRequest {
    /// A fresh search with no applied filters
    pub fn new(prompt: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            prompt: prompt.into(),
            applied_filters: Vec::new(),
            source_type,
        }
    }

    /// Refine an existing filter set
    pub fn with_applied(mut self, applied_filters: Vec<FilterInstance>) -> Self {
        self.applied_filters = applied_filters;
        self
    }
}

/// Short note on what the prompt did and did not map to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Parts of the prompt that became filters
    #[serde(default)]
    pub matched: String,

    /// Parts of the prompt that could not be expressed as filters
    #[serde(default)]
    pub unmatched: String,
}

impl Explanation {
    /// Build an explanation from its two parts
    pub fn new(matched: impl Into<String>, unmatched: impl Into<String>) -> Self {
        Self {
            matched: matched.into(),
            unmatched: unmatched.into(),
        }
    }

    /// Used when the model omits the explanation
    pub fn none_matched() -> Self {
        Self::new("", "No filters matched.")
    }

    /// Read an explanation out of a model reply, tolerating partial objects
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let part = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self::new(part("matched"), part("unmatched")))
    }

    /// Append a note to the unmatched part
    pub(crate) fn note_unmatched(&mut self, note: &str) {
        if self.unmatched.is_empty() {
            self.unmatched = note.to_string();
        } else {
            self.unmatched = format!("{} {}", self.unmatched.trim_end(), note);
        }
    }
}

/// Result of an extraction
///
/// Serializes to the response shape consumed by the search UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Identifier of this search (`search_<id>`)
    pub search_id: String,

    /// `multiple_properties` or `multiple_people`
    pub search_type: String,

    /// Human-readable name of the search
    pub search_name: String,

    /// What matched and what did not
    pub explanation: Explanation,

    /// Canonical merged filter set
    pub extracted_criteria: Vec<FilterInstance>,

    /// Size of `extracted_criteria`
    pub filter_count: usize,

    /// Validated filters whose id was not applied before
    pub new_filter_count: usize,

    /// Validated filters whose id was already applied
    pub updated_filter_count: usize,

    /// Number of filters the request carried in
    pub applied_filters_count: usize,

    /// Candidates the model proposed that failed validation
    pub rejected_filter_count: usize,

    /// Whether the structured request failed and free text was parsed
    pub used_fallback: bool,

    /// Raw model reply on the fallback path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_llm_response: Option<String>,

    /// Failure message when the model could not be used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Split caller-supplied applied filters into an optional source override and filters
///
/// Callers may lead the list with a pseudo-filter
/// `{"type": "source_type", "value": "properties" | "contacts"}` that pins the
/// dataset; it is removed from the returned filters.
pub fn parse_applied_filters(
    values: Vec<Value>,
) -> Result<(Option<SourceType>, Vec<FilterInstance>), ExtractorError> {
    let mut source_override = None;
    let mut filters = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        if value.get("type").and_then(Value::as_str) == Some("source_type") {
            let declared = value.get("value").and_then(Value::as_str).unwrap_or_default();
            source_override = Some(SourceType::parse(declared).ok_or_else(|| {
                ExtractorError::InvalidApplied(format!(
                    "unknown source type '{}' in source_type filter",
                    declared
                ))
            })?);
            continue;
        }

        let filter: FilterInstance = serde_json::from_value(value).map_err(|e| {
            ExtractorError::InvalidApplied(format!("filter #{}: {}", index, e))
        })?;
        filters.push(filter);
    }

    Ok((source_override, filters))
}
