//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::merge::MergeEngine;
use crate::parser::{candidate_list, parse_fenced_filters, parse_reply_object};
use crate::prompt::{
    naming_message, naming_schema, response_schema, user_message, PromptBuilder,
    NAMING_INSTRUCTIONS,
};
use crate::types::{ExtractionRequest, ExtractionResult, Explanation};
use hearth_domain::{CompletionOptions, FilterInstance, LlmProvider, SourceType};
use hearth_gatekeeper::{Gatekeeper, RejectionReason};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What the model contributed to one extraction
#[derive(Debug, Default)]
struct ModelReply {
    candidates: Vec<Value>,
    explanation: Option<Explanation>,
    search_name: Option<String>,
    used_fallback: bool,
    raw_llm_response: Option<String>,
    error: Option<String>,
}

impl ModelReply {
    /// Read `filters`, `explanation` and `search_name` from a reply object
    fn from_object(mut object: Map<String, Value>) -> Self {
        let candidates = candidate_list(object.remove("filters").unwrap_or(Value::Null));
        let explanation = object.get("explanation").and_then(Explanation::from_value);
        let search_name = object
            .get("search_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Self {
            candidates,
            explanation,
            search_name,
            ..Self::default()
        }
    }
}

/// The Extractor turns a natural-language prompt into a canonical filter set
pub struct Extractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    gatekeeper: Gatekeeper,
    merge: MergeEngine,
    config: ExtractorConfig,
}

impl<L> Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a new Extractor
    pub fn new(llm_provider: L, gatekeeper: Gatekeeper, config: ExtractorConfig) -> Self {
        Self {
            llm_provider: Arc::new(llm_provider),
            gatekeeper,
            merge: MergeEngine::new(),
            config,
        }
    }

    /// The extractor's configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract filters from a prompt and merge them with the applied filters
    ///
    /// Never fails: model and parsing failures degrade to a result that
    /// carries the applied filters unchanged and, where nothing usable came
    /// back, an `error` message.
    pub async fn extract(&self, request: ExtractionRequest) -> ExtractionResult {
        let source_type = request.source_type;
        let applied_count = request.applied_filters.len();

        if request.prompt.trim().is_empty() {
            return self.name_only(request).await;
        }

        info!(
            "Starting {} extraction: prompt length {}, {} applied filters",
            source_type,
            request.prompt.len(),
            applied_count
        );

        let reply = match self.request_candidates(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error extracting search criteria: {}", e);
                return self.failed(request, e.to_string());
            }
        };

        let report = self.gatekeeper.admit_all(&reply.candidates, source_type);
        let rejected = report.rejected.len();
        // Filters for the other dataset are dropped without a note
        let reported = report
            .rejected
            .iter()
            .filter(|r| !matches!(r.reason, RejectionReason::SourceMismatch { .. }))
            .count();
        let outcome = self.merge.merge(&request.applied_filters, report.accepted);

        let mut explanation = reply.explanation.unwrap_or_else(Explanation::none_matched);
        if reported > 0 {
            explanation.note_unmatched(&format!(
                "{} proposed filter(s) were invalid and dropped.",
                reported
            ));
        }

        let search_name = reply
            .search_name
            .unwrap_or_else(|| self.default_name(&request.prompt, source_type, applied_count));

        info!(
            "Extraction complete: {} filters ({} new, {} updated, {} rejected)",
            outcome.filters.len(),
            outcome.new_filter_count,
            outcome.updated_filter_count,
            rejected
        );

        ExtractionResult {
            search_id: new_search_id(),
            search_type: source_type.search_type().to_string(),
            search_name,
            explanation,
            filter_count: outcome.filters.len(),
            extracted_criteria: outcome.filters,
            new_filter_count: outcome.new_filter_count,
            updated_filter_count: outcome.updated_filter_count,
            applied_filters_count: applied_count,
            rejected_filter_count: rejected,
            used_fallback: reply.used_fallback,
            raw_llm_response: reply.raw_llm_response,
            error: reply.error,
        }
    }

    /// Generate a name for an existing filter set
    ///
    /// Returns "Untitled Search" for an empty set and a count-based name when
    /// the model cannot provide one.
    pub async fn name_filters(&self, filters: &[FilterInstance], source_type: SourceType) -> String {
        if filters.is_empty() {
            return "Untitled Search".to_string();
        }

        let fallback = format!("{} ({} filters)", source_type.search_label(), filters.len());
        let message = naming_message(filters, source_type);
        let options = self.config.naming_options();

        match self
            .call_structured(NAMING_INSTRUCTIONS.to_string(), message, naming_schema(), options)
            .await
        {
            Ok(reply) => {
                let name: String = reply
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| *c != '"' && *c != '\'')
                    .collect();
                let name = name.trim();
                if name.is_empty() {
                    warn!("Naming reply had no name, using fallback");
                    fallback
                } else {
                    name.to_string()
                }
            }
            Err(e) => {
                warn!("Failed to generate search name: {}", e);
                fallback
            }
        }
    }

    /// Name used when the model does not supply one
    ///
    /// `"<Label>: <first chars of prompt>"`, with `...` when truncated, and
    /// prefixed with `"(N) "` when N filters were already applied.
    pub fn default_name(&self, prompt: &str, source_type: SourceType, applied_count: usize) -> String {
        let prompt = prompt.trim();
        let limit = self.config.name_prompt_chars;
        let mut excerpt: String = prompt.chars().take(limit).collect();
        if prompt.chars().count() > limit {
            excerpt.push_str("...");
        }

        let name = format!("{}: {}", source_type.search_label(), excerpt);
        if applied_count > 0 {
            format!("({}) {}", applied_count, name)
        } else {
            name
        }
    }

    /// Run the request through the structured call and its fallbacks
    ///
    /// Errors only when the fallback text request itself fails.
    async fn request_candidates(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ModelReply, ExtractorError> {
        let system_prompt = PromptBuilder::new(
            request.source_type,
            self.gatekeeper.catalog().for_source(request.source_type),
        )
        .with_applied_filters(&request.applied_filters, self.config.context_filters_limit)
        .build();
        let user = user_message(&request.prompt);
        let options = self.config.extraction_options();

        debug!("System prompt length: {} chars", system_prompt.len());

        let structured = self
            .call_structured(
                system_prompt.clone(),
                user.clone(),
                response_schema(),
                options.clone(),
            )
            .await
            .and_then(|reply| match reply {
                Value::Object(object) => Ok(object),
                other => Err(ExtractorError::ModelOutput(format!(
                    "structured reply is not an object: {}",
                    other
                ))),
            });

        match structured {
            Ok(object) => {
                let reply = ModelReply::from_object(object);
                debug!("Structured reply with {} candidates", reply.candidates.len());
                Ok(reply)
            }
            Err(e) => {
                warn!(
                    "JSON structured output failed, falling back to text parsing: {}",
                    e
                );
                let text = self.call_text(system_prompt, user, options).await?;
                Ok(parse_fallback(text))
            }
        }
    }

    /// Result for an empty prompt: name the applied filters, extract nothing
    async fn name_only(&self, request: ExtractionRequest) -> ExtractionResult {
        let source_type = request.source_type;
        let applied_count = request.applied_filters.len();

        let (search_name, error) = if request.applied_filters.is_empty() {
            warn!("Empty prompt with no applied filters");
            ("Untitled Search".to_string(), Some("No prompt provided".to_string()))
        } else {
            info!("Empty prompt, naming {} applied filters", applied_count);
            (
                self.name_filters(&request.applied_filters, source_type).await,
                None,
            )
        };

        ExtractionResult {
            search_id: new_search_id(),
            search_type: source_type.search_type().to_string(),
            search_name,
            explanation: Explanation::default(),
            filter_count: applied_count,
            extracted_criteria: request.applied_filters,
            new_filter_count: 0,
            updated_filter_count: 0,
            applied_filters_count: applied_count,
            rejected_filter_count: 0,
            used_fallback: false,
            raw_llm_response: None,
            error,
        }
    }

    /// Result when the model could not be reached at all
    fn failed(&self, request: ExtractionRequest, message: String) -> ExtractionResult {
        let source_type = request.source_type;
        let applied_count = request.applied_filters.len();

        ExtractionResult {
            search_id: new_search_id(),
            search_type: source_type.search_type().to_string(),
            search_name: self.default_name(&request.prompt, source_type, applied_count),
            explanation: Explanation::new("", "Query resulted in an error"),
            filter_count: applied_count,
            extracted_criteria: request.applied_filters,
            new_filter_count: 0,
            updated_filter_count: 0,
            applied_filters_count: applied_count,
            rejected_filter_count: 0,
            used_fallback: true,
            raw_llm_response: None,
            error: Some(message),
        }
    }

    /// Call the structured endpoint of the provider
    async fn call_structured(
        &self,
        system_prompt: String,
        prompt: String,
        schema: Value,
        options: CompletionOptions,
    ) -> Result<Value, ExtractorError> {
        let llm = Arc::clone(&self.llm_provider);

        // Call in a blocking context since LlmProvider is not async
        tokio::task::spawn_blocking(move || {
            llm.generate_structured(&system_prompt, &prompt, &schema, &options)
                .map_err(|e| ExtractorError::ModelRequest(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::ModelRequest(format!("Task join error: {}", e)))?
    }

    /// Call the free-text endpoint of the provider
    async fn call_text(
        &self,
        system_prompt: String,
        prompt: String,
        options: CompletionOptions,
    ) -> Result<String, ExtractorError> {
        let llm = Arc::clone(&self.llm_provider);

        tokio::task::spawn_blocking(move || {
            llm.generate(&system_prompt, &prompt, &options)
                .map_err(|e| ExtractorError::ModelRequest(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::ModelRequest(format!("Task join error: {}", e)))?
    }
}

/// Degraded parsing of a free-text reply
fn parse_fallback(text: String) -> ModelReply {
    let mut reply = match parse_reply_object(&text) {
        Ok(object) => ModelReply::from_object(object),
        Err(e) => {
            debug!("Text reply is not a JSON object ({}), scanning for a fenced array", e);
            match parse_fenced_filters(&text) {
                Some(candidates) => ModelReply {
                    candidates,
                    explanation: Some(Explanation::new("Filters extracted from query", "")),
                    ..ModelReply::default()
                },
                None => ModelReply {
                    explanation: Some(Explanation::new("", "No filters could be extracted")),
                    error: Some(format!("Could not parse filters from model reply: {}", e)),
                    ..ModelReply::default()
                },
            }
        }
    };

    reply.used_fallback = true;
    reply.raw_llm_response = Some(text);
    reply
}

fn new_search_id() -> String {
    format!("search_{}", Uuid::now_v7().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::FilterCatalog;
    use hearth_llm::MockProvider;

    fn create_test_extractor(llm: MockProvider) -> Extractor<MockProvider> {
        let gatekeeper = Gatekeeper::new(Arc::new(FilterCatalog::builtin()));
        Extractor::new(llm, gatekeeper, ExtractorConfig::default())
    }

    #[test]
    fn test_default_name_truncates() {
        let extractor = create_test_extractor(MockProvider::default());
        assert_eq!(
            extractor.default_name("3 bed homes", SourceType::Properties, 0),
            "Property Search: 3 bed homes"
        );
        assert_eq!(
            extractor.default_name(
                "homes with pools near the beach under 500k",
                SourceType::Properties,
                0
            ),
            "Property Search: homes with pools near the beac..."
        );
        assert_eq!(
            extractor.default_name("retirees", SourceType::Contacts, 2),
            "(2) Contact Search: retirees"
        );
    }

    #[test]
    fn test_default_name_counts_chars_not_bytes() {
        let extractor = create_test_extractor(MockProvider::default());
        let name = extractor.default_name(&"é".repeat(40), SourceType::Properties, 0);
        assert_eq!(name, format!("Property Search: {}...", "é".repeat(30)));
    }

    #[test]
    fn test_fallback_parse_states() {
        let parsed = parse_fallback(r#"{"filters": [{"id": 1}], "search_name": "X"}"#.to_string());
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.search_name.as_deref(), Some("X"));
        assert!(parsed.used_fallback);
        assert!(parsed.error.is_none());

        let fenced = parse_fallback("Sure!\n```\n[{\"id\": 1}, {\"id\": 2}]\n```".to_string());
        assert_eq!(fenced.candidates.len(), 2);
        assert_eq!(
            fenced.explanation,
            Some(Explanation::new("Filters extracted from query", ""))
        );

        let nothing = parse_fallback("I can't help with that.".to_string());
        assert!(nothing.candidates.is_empty());
        assert!(nothing.error.is_some());
        assert_eq!(nothing.raw_llm_response.as_deref(), Some("I can't help with that."));
    }

    #[test]
    fn test_search_id_shape() {
        let id = new_search_id();
        assert!(id.starts_with("search_"));
        assert_eq!(id.len(), "search_".len() + 32);
    }

    #[tokio::test]
    async fn test_name_filters_empty_set() {
        let llm = MockProvider::default();
        let extractor = create_test_extractor(llm.clone());
        let name = extractor.name_filters(&[], SourceType::Properties).await;
        assert_eq!(name, "Untitled Search");
        assert_eq!(llm.call_count(), 0);
    }
}
