//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use hearth_domain::{FilterDefinition, FilterInstance, ValueType};
use hearth_extractor::ExtractionResult;
use hearth_gatekeeper::operators_for;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extraction result.
    pub fn format_extraction(&self, result: &ExtractionResult) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(result)?);
        }

        let mut lines = vec![self.colorize(&result.search_name, "cyan")];
        lines.push(format!(
            "{} filters ({} new, {} updated, {} applied before)",
            result.filter_count,
            result.new_filter_count,
            result.updated_filter_count,
            result.applied_filters_count
        ));
        if !result.explanation.matched.is_empty() {
            lines.push(format!("Matched: {}", result.explanation.matched));
        }
        if !result.explanation.unmatched.is_empty() {
            lines.push(format!("Unmatched: {}", result.explanation.unmatched));
        }
        if result.used_fallback {
            lines.push(self.warning("Structured output failed; parsed a text reply"));
        }
        if let Some(error) = &result.error {
            lines.push(self.error(error));
        }
        lines.push(self.format_filters_table(&result.extracted_criteria));

        Ok(lines.join("\n"))
    }

    /// Format catalog definitions.
    pub fn format_catalog(&self, definitions: &[&FilterDefinition]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(definitions)?);
        }
        if definitions.is_empty() {
            return Ok(self.colorize("No filters defined.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Source", "Label", "Type", "Operators / Options", "Aliases"]);

        for def in definitions {
            let choices = match &def.options {
                Some(options) if def.value_type == ValueType::Multiselect => options
                    .iter()
                    .map(|o| format!("{}={}", o.id, o.label))
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => operators_for(def.value_type).join(", "),
            };
            builder.push_record([
                def.id.to_string(),
                def.source_type.to_string(),
                def.label.clone(),
                def.value_type.to_string(),
                choices,
                def.aliases.join(", "),
            ]);
        }

        Ok(self.styled(builder))
    }

    /// Format a generated search name.
    pub fn format_name(&self, name: &str) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&serde_json::json!({ "name": name }))?);
        }
        Ok(self.success(name))
    }

    /// Format filters as a table.
    fn format_filters_table(&self, filters: &[FilterInstance]) -> String {
        if filters.is_empty() {
            return self.colorize("No filters extracted.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Label", "Type", "Operator", "Value"]);

        for filter in filters {
            builder.push_record([
                filter.id.to_string(),
                filter.label.clone(),
                filter.value_type.to_string(),
                filter.operator_str().to_string(),
                filter.value.to_string(),
            ]);
        }

        self.styled(builder)
    }

    fn styled(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::{FilterCatalog, SourceType};
    use hearth_extractor::Explanation;
    use serde_json::json;

    fn create_test_result() -> ExtractionResult {
        let filter: FilterInstance = serde_json::from_value(json!({
            "id": 3, "type": "number", "source_type": "properties",
            "label": "Bedrooms", "filterType": "gte", "value": {"gte": 3}
        }))
        .unwrap();

        ExtractionResult {
            search_id: "search_test".to_string(),
            search_type: "multiple_properties".to_string(),
            search_name: "Big Family Homes".to_string(),
            explanation: Explanation::new("3+ bedrooms", "good schools"),
            extracted_criteria: vec![filter],
            filter_count: 1,
            new_filter_count: 1,
            updated_filter_count: 0,
            applied_filters_count: 0,
            rejected_filter_count: 0,
            used_fallback: false,
            raw_llm_response: None,
            error: None,
        }
    }

    #[test]
    fn test_extraction_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_extraction(&create_test_result()).unwrap();
        assert!(output.starts_with("Big Family Homes"));
        assert!(output.contains("Unmatched: good schools"));
        assert!(output.contains("Bedrooms"));
        assert!(output.contains("{\"gte\":3}"));
    }

    #[test]
    fn test_extraction_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_extraction(&create_test_result()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["extracted_criteria"][0]["filterType"], "gte");
        assert_eq!(parsed["search_id"], "search_test");
    }

    #[test]
    fn test_catalog_table() {
        let catalog = FilterCatalog::builtin();
        let defs: Vec<_> = catalog.for_source(SourceType::Properties).collect();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_catalog(&defs).unwrap();
        assert!(output.contains("Operators / Options"));
        assert!(output.contains("1=Pool"));
        assert!(!output.contains("contains_any"));
        assert!(!output.contains("Household Income"));
    }

    #[test]
    fn test_empty_catalog() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_catalog(&[]).unwrap();
        assert!(output.contains("No filters defined"));
    }

    #[test]
    fn test_name_output() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.format_name("Pool Homes").unwrap(), "✓ Pool Homes");

        let formatter = Formatter::new(OutputFormat::Json, false);
        assert!(formatter.format_name("Pool Homes").unwrap().contains("\"name\""));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.warning("test"), "⚠ test");
    }
}
