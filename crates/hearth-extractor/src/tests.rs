//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{ExtractionRequest, Extractor, ExtractorConfig};
    use hearth_domain::{FilterCatalog, FilterInstance, SourceType};
    use hearth_gatekeeper::Gatekeeper;
    use hearth_llm::MockProvider;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn gatekeeper() -> Gatekeeper {
        Gatekeeper::new(Arc::new(FilterCatalog::builtin()))
    }

    fn extractor(llm: MockProvider) -> Extractor<MockProvider> {
        Extractor::new(llm, gatekeeper(), ExtractorConfig::default())
    }

    fn applied_bedrooms() -> FilterInstance {
        serde_json::from_value(json!({
            "id": 3,
            "type": "number",
            "source_type": "properties",
            "label": "Bedrooms",
            "filterType": "eq",
            "value": 3,
            "timestamp": 1_600_000_000,
            "custom_label": "Beds"
        }))
        .unwrap()
    }

    fn candidates() -> Value {
        json!([
            {"id": 1, "type": "number", "source_type": "properties", "label": "Property Value",
             "filterType": "lt", "value": 400000, "timestamp": 1_700_000_000},
            {"id": 8, "type": "bool", "source_type": "properties", "label": "Owner Occupied",
             "value": true, "timestamp": 1_700_000_000},
            {"id": 999, "type": "number", "source_type": "properties", "label": "Made Up",
             "filterType": "eq", "value": 1, "timestamp": 1_700_000_000}
        ])
    }

    #[tokio::test]
    async fn test_structured_extraction_flow() {
        let reply = json!({
            "filters": candidates(),
            "explanation": {"matched": "price, owner occupied", "unmatched": ""},
            "search_name": "Owner Homes Under 400K"
        });
        let llm = MockProvider::new(reply.to_string());
        let extractor = extractor(llm.clone());

        let result = extractor
            .extract(ExtractionRequest::new(
                "owner occupied homes under 400k",
                SourceType::Properties,
            ))
            .await;

        assert!(result.error.is_none());
        assert!(!result.used_fallback);
        assert!(result.raw_llm_response.is_none());
        assert_eq!(result.search_name, "Owner Homes Under 400K");
        assert_eq!(result.search_type, "multiple_properties");
        assert!(result.search_id.starts_with("search_"));

        let keys: Vec<_> = result.extracted_criteria.iter().map(FilterInstance::key).collect();
        assert_eq!(keys, vec!["1:lt", "8:"]);
        assert_eq!(result.extracted_criteria[0].value, json!({"lt": 400000}));
        assert_eq!(result.extracted_criteria[1].value, json!("yes"));
        assert_eq!(result.filter_count, 2);
        assert_eq!(result.new_filter_count, 2);
        assert_eq!(result.rejected_filter_count, 1);
        assert!(result.explanation.unmatched.contains("1 proposed filter(s) were invalid"));

        // One structured call, no fallback
        assert_eq!(llm.call_count(), 1);
        assert_eq!(llm.structured_call_count(), 1);
    }

    #[tokio::test]
    async fn test_extraction_uses_configured_options() {
        let llm = MockProvider::new(r#"{"filters": []}"#);
        let extractor = extractor(llm.clone());
        extractor
            .extract(ExtractionRequest::new("anything", SourceType::Contacts))
            .await;

        let options = llm.last_options().unwrap();
        assert_eq!(options.model.as_deref(), Some("gpt-4o"));
        assert_eq!(options.temperature, 0.3);
        assert_eq!(options.max_tokens, 2000);

        let system = llm.last_system_prompt().unwrap();
        assert!(system.contains("Household Income"));
    }

    #[tokio::test]
    async fn test_fallback_fenced_array_matches_direct_validation() {
        let text = format!(
            "I found these filters:\n```json\n{}\n```\nLet me know if you need more.",
            serde_json::to_string_pretty(&candidates()).unwrap()
        );
        let llm = MockProvider::new(text.clone()).failing_structured();
        let extractor = extractor(llm.clone());

        let result = extractor
            .extract(ExtractionRequest::new("cheap owner homes", SourceType::Properties))
            .await;

        let direct = gatekeeper().admit_all(
            candidates().as_array().unwrap(),
            SourceType::Properties,
        );
        assert_eq!(result.extracted_criteria, direct.accepted);
        assert!(result.used_fallback);
        assert_eq!(result.raw_llm_response.as_deref(), Some(text.as_str()));
        assert_eq!(result.explanation.matched, "Filters extracted from query");
        assert!(result.error.is_none());
        assert_eq!(result.search_name, "Property Search: cheap owner homes");

        // Structured attempt, then one text attempt
        assert_eq!(llm.structured_call_count(), 1);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fallback_text_object_is_parsed() {
        let text = json!({
            "filters": {"type": "array", "items": [
                {"id": 6, "type": "text", "source_type": "properties", "label": "City",
                 "filterType": "equals", "value": {"type": "equals", "text": "Austin"}}
            ]},
            "explanation": {"matched": "Austin", "unmatched": "near good schools"},
            "search_name": "Austin Homes"
        })
        .to_string();
        let extractor = extractor(MockProvider::new(text).failing_structured());

        let result = extractor
            .extract(ExtractionRequest::new(
                "homes in Austin near good schools",
                SourceType::Properties,
            ))
            .await;

        assert!(result.used_fallback);
        assert_eq!(result.filter_count, 1);
        assert_eq!(result.extracted_criteria[0].label, "City");
        assert_eq!(result.explanation.unmatched, "near good schools");
        assert_eq!(result.search_name, "Austin Homes");
    }

    #[tokio::test]
    async fn test_total_failure_returns_applied_filters() {
        let llm = MockProvider::new("unused").failing_structured().failing_text();
        let extractor = extractor(llm);
        let applied = vec![applied_bedrooms()];

        let result = extractor
            .extract(
                ExtractionRequest::new("add a pool", SourceType::Properties)
                    .with_applied(applied.clone()),
            )
            .await;

        assert_eq!(result.extracted_criteria, applied);
        assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert_eq!(result.explanation.unmatched, "Query resulted in an error");
        assert_eq!(result.applied_filters_count, 1);
        assert_eq!(result.search_name, "(1) Property Search: add a pool");
    }

    #[tokio::test]
    async fn test_unparseable_reply_keeps_applied_and_reports() {
        let llm = MockProvider::new("Sorry, I cannot do that.").failing_structured();
        let applied = vec![applied_bedrooms()];

        let result = extractor(llm)
            .extract(
                ExtractionRequest::new("something odd", SourceType::Properties)
                    .with_applied(applied.clone()),
            )
            .await;

        assert_eq!(result.extracted_criteria, applied);
        assert!(result.error.is_some());
        assert_eq!(result.explanation.unmatched, "No filters could be extracted");
        assert_eq!(result.new_filter_count, 0);
        assert_eq!(result.updated_filter_count, 0);
    }

    #[tokio::test]
    async fn test_fenced_scalar_reply_is_not_an_extraction() {
        let llm = MockProvider::new("No matches.\n```json\n\"none\"\n```").failing_structured();

        let result = extractor(llm)
            .extract(ExtractionRequest::new("something odd", SourceType::Properties))
            .await;

        assert!(result.extracted_criteria.is_empty());
        assert!(result.error.is_some());
        assert!(result.used_fallback);
        assert_eq!(result.explanation.unmatched, "No filters could be extracted");
    }

    #[tokio::test]
    async fn test_refinement_updates_applied_filter() {
        let reply = json!({
            "filters": [
                {"id": 3, "type": "number", "source_type": "properties", "label": "Bedrooms",
                 "filterType": "range", "value": {"min": 4, "max": 2}},
                {"id": 12, "type": "multiselect", "source_type": "properties", "label": "Amenities",
                 "filterType": "contains_any", "value": {"values": [{"id": 1, "label": "Swimming pool"}]}}
            ],
            "explanation": {"matched": "2-4 bedrooms, pool", "unmatched": ""}
        });
        let extractor = extractor(MockProvider::new("unused").with_structured(reply));

        let result = extractor
            .extract(
                ExtractionRequest::new("make it 2 to 4 beds with a pool", SourceType::Properties)
                    .with_applied(vec![applied_bedrooms()]),
            )
            .await;

        assert_eq!(result.filter_count, 2);
        let bedrooms = &result.extracted_criteria[0];
        assert_eq!(bedrooms.key(), "3:range");
        assert_eq!(bedrooms.value, json!({"min": 2, "max": 4}));
        assert_eq!(bedrooms.extra["custom_label"], "Beds");

        let amenities = &result.extracted_criteria[1];
        assert_eq!(
            amenities.value,
            json!({"values": [{"id": 1, "label": "Swimming pool"}]})
        );
        assert!(amenities.has_field("options"));

        assert_eq!(result.updated_filter_count, 1);
        assert_eq!(result.new_filter_count, 1);
        // No search_name in the reply: prompt-based name with the applied count
        assert_eq!(result.search_name, "(1) Property Search: make it 2 to 4 beds with a po...");
    }

    #[tokio::test]
    async fn test_source_mismatch_dropped() {
        let reply = json!({
            "filters": [
                {"id": 18, "type": "number", "source_type": "contacts", "label": "Age",
                 "filterType": "gte", "value": {"gte": 65}}
            ]
        });
        let extractor = extractor(MockProvider::new("unused").with_structured(reply));

        let result = extractor
            .extract(ExtractionRequest::new("owners over 65", SourceType::Properties))
            .await;

        assert!(result.extracted_criteria.is_empty());
        assert_eq!(result.rejected_filter_count, 1);
        assert!(!result.explanation.unmatched.contains("dropped"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_empty_prompt_names_applied_filters() {
        let llm = MockProvider::new("unused").with_structured(json!({"name": "\"Three Bedroom Homes\""}));
        let extractor = extractor(llm.clone());
        let applied = vec![applied_bedrooms()];

        let result = extractor
            .extract(ExtractionRequest::new("  ", SourceType::Properties).with_applied(applied.clone()))
            .await;

        assert_eq!(result.search_name, "Three Bedroom Homes");
        assert_eq!(result.extracted_criteria, applied);
        assert_eq!(result.filter_count, 1);
        assert!(result.error.is_none());

        let options = llm.last_options().unwrap();
        assert_eq!(options.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(options.temperature, 0.7);
    }

    #[tokio::test]
    async fn test_empty_prompt_without_filters_is_an_error() {
        let llm = MockProvider::default();
        let result = extractor(llm.clone())
            .extract(ExtractionRequest::new("", SourceType::Properties))
            .await;

        assert_eq!(result.error.as_deref(), Some("No prompt provided"));
        assert!(result.extracted_criteria.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_naming_falls_back_on_failure() {
        let extractor = extractor(MockProvider::new("unused").failing_structured());
        let filters = vec![applied_bedrooms(), applied_bedrooms()];

        assert_eq!(
            extractor.name_filters(&filters, SourceType::Properties).await,
            "Property Search (2 filters)"
        );
        assert_eq!(
            extractor.name_filters(&filters[..1], SourceType::Contacts).await,
            "Contact Search (1 filters)"
        );
    }

    #[tokio::test]
    async fn test_naming_rejects_blank_name() {
        let extractor = extractor(MockProvider::new("unused").with_structured(json!({"name": "''"})));
        assert_eq!(
            extractor
                .name_filters(&[applied_bedrooms()], SourceType::Properties)
                .await,
            "Property Search (1 filters)"
        );
    }

    #[test]
    fn test_extract_from_sync_context() {
        let extractor = extractor(MockProvider::new(r#"{"filters": []}"#));
        let result = tokio_test::block_on(
            extractor.extract(ExtractionRequest::new("nothing useful", SourceType::Properties)),
        );
        assert_eq!(result.filter_count, 0);
        assert_eq!(result.explanation.unmatched, "No filters matched.");
    }
}
