//! LLM prompt engineering for filter extraction and naming

use hearth_domain::{FilterDefinition, FilterInstance, SourceType, ValueType};
use hearth_gatekeeper::operators_for;
use serde_json::{json, Value};

/// Builds the extraction system prompt
pub struct PromptBuilder<'a> {
    source_type: SourceType,
    definitions: Vec<&'a FilterDefinition>,
    applied_filters: Vec<&'a FilterInstance>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder over the catalog entries of one source type
    pub fn new(
        source_type: SourceType,
        definitions: impl IntoIterator<Item = &'a FilterDefinition>,
    ) -> Self {
        Self {
            source_type,
            definitions: definitions.into_iter().collect(),
            applied_filters: Vec::new(),
        }
    }

    /// Show already-applied filters to the model, keeping at most `limit`
    pub fn with_applied_filters(mut self, filters: &'a [FilterInstance], limit: usize) -> Self {
        self.applied_filters = filters.iter().take(limit).collect();
        self
    }

    /// Build the complete system prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Role
        prompt.push_str(&format!(
            "You are a specialized AI designed to extract {} search filters from natural language queries.\n",
            self.subject()
        ));
        prompt.push_str(
            "Your task is to analyze user queries and transform them into structured filter objects.\n\n",
        );

        // 2. Catalog and schema
        prompt.push_str("AVAILABLE FILTERS:\n");
        prompt.push_str(&pretty(&serde_json::to_value(&self.definitions).unwrap_or(Value::Null)));
        prompt.push_str("\n\nFILTER SCHEMA:\n");
        prompt.push_str(&pretty(&filter_schema()));
        prompt.push_str("\n\n");

        // 3. Per-type formats
        prompt.push_str(&format!(
            "FILTER STRUCTURE REQUIREMENTS:\n\
             1. All filters must include: id, type, source_type, label, filterType and value\n\
             2. Valid filter types are: {}\n\
             3. source_type must be \"{}\"\n\n",
            ValueType::ALL
                .iter()
                .map(|t| format!("\"{}\"", t))
                .collect::<Vec<_>>()
                .join(", "),
            self.source_type
        ));
        prompt.push_str(FORMAT_GUIDANCE);
        prompt.push_str("\n\n");

        // 4. Refinement context
        if !self.applied_filters.is_empty() {
            prompt.push_str(
                "CURRENTLY APPLIED FILTERS (the user is refining this search; \
                 return only filters to add or change, reusing the same id and filterType \
                 to update an applied filter):\n",
            );
            prompt.push_str(&pretty(
                &serde_json::to_value(&self.applied_filters).unwrap_or(Value::Null),
            ));
            prompt.push_str("\n\n");
        }

        // 5. Explanation, naming, response format
        prompt.push_str(ADDITIONAL_TASKS);
        prompt.push_str("\n\n");
        prompt.push_str(RESPONSE_FORMAT);

        prompt
    }

    fn subject(&self) -> &'static str {
        match self.source_type {
            SourceType::Properties => "property",
            SourceType::Contacts => "contact",
        }
    }
}

/// The user message sent alongside the system prompt
pub fn user_message(prompt: &str) -> String {
    format!(
        "Extract filters from this prompt and provide a brief explanation: \"{}\"",
        prompt
    )
}

/// JSON schema of the candidate filter list, shown to the model
pub fn filter_schema() -> Value {
    let operator_rule = |value_type: ValueType| {
        json!({
            "if": {"properties": {"type": {"enum": [value_type.as_str()]}}},
            "then": {
                "required": ["filterType"],
                "properties": {"filterType": {"enum": operators_for(value_type)}}
            }
        })
    };

    json!({
        "type": "array",
        "items": {
            "type": "object",
            // filterType is required per type below; bool filters have none
            "required": ["id", "type", "source_type", "label", "value"],
            "properties": {
                "id": {"type": "integer"},
                "type": {"type": "string", "enum": ValueType::ALL.iter().map(ValueType::as_str).collect::<Vec<_>>()},
                "subtype": {"type": ["string", "null"]},
                "source_type": {"type": "string", "enum": ["properties", "contacts"]},
                "label": {"type": "string"},
                "filterType": {"type": "string"},
                "value": {"type": ["object", "string", "number", "boolean"]}
            },
            "allOf": [
                operator_rule(ValueType::Number),
                operator_rule(ValueType::Text),
                operator_rule(ValueType::Date),
                operator_rule(ValueType::Multiselect)
            ]
        }
    })
}

/// JSON schema of the structured extraction reply
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["filters", "explanation", "search_name"],
        "properties": {
            "filters": filter_schema(),
            "explanation": {
                "type": "object",
                "required": ["matched", "unmatched"],
                "properties": {
                    "matched": {"type": "string"},
                    "unmatched": {"type": "string"}
                }
            },
            "search_name": {"type": "string"}
        }
    })
}

/// System prompt for naming a filter set
pub const NAMING_INSTRUCTIONS: &str = r#"You are a helpful assistant that generates concise, descriptive names for saved searches.
Create a search name that summarizes the key filters while remaining brief.
For property searches: Focus on property type, location, bedrooms/bathrooms, and price when available.
For contact searches: Focus on profession, location, age, and income when available.
Keep names under 60 characters when possible.
IMPORTANT: Do not include any quotation marks around the name in your response."#;

/// User message asking for a name for `filters`
pub fn naming_message(filters: &[FilterInstance], source_type: SourceType) -> String {
    format!(
        "Generate a concise, descriptive name for a {} search with these filters:\n{}",
        source_type.search_type(),
        pretty(&serde_json::to_value(filters).unwrap_or(Value::Null))
    )
}

/// JSON schema of the naming reply
pub fn naming_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "A concise, descriptive name for the search without any quotation marks"
            }
        },
        "required": ["name"]
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

const FORMAT_GUIDANCE: &str = r#"NUMBER FILTER FORMAT:
- For ranges: {"type":"number", "filterType":"range", "value":{"min":number, "max":number}}
- For single comparisons gt/gte/lt/lte/neq: {"type":"number", "filterType":"lt", "value":{"lt":100000}} - IMPORTANT: value must be an object with filterType as key
- For equality: {"type":"number", "filterType":"eq", "value":number}

EXAMPLES OF CORRECT NUMBER FILTERS:
- Less than $100,000: {"id":1, "type":"number", "source_type":"properties", "label":"Property Value", "filterType":"lt", "value":{"lt":100000}}
- Between $200,000 and $500,000: {"id":1, "type":"number", "source_type":"properties", "label":"Property Value", "filterType":"range", "value":{"min":200000, "max":500000}}
- Exactly 3 bedrooms: {"id":3, "type":"number", "source_type":"properties", "label":"Bedrooms", "filterType":"eq", "value":3}

TEXT FILTER FORMAT:
- Standard text: {"type":"text", "filterType":"contains|starts_with|ends_with|equals|not_equals|not_contains", "value":{"type":<filterType>, "text":string}}
- Multi-value: {"type":"text", "filterType":"any_of", "value":{"type":"any_of", "values":[strings]}}

BOOLEAN FILTER FORMAT:
- {"type":"bool", "value":"yes"|"no"}

MULTISELECT FILTER FORMAT:
- {"type":"multiselect", "filterType":"contains_any|contains_none", "value":{"values":[{"id":id, "label":string}]}}
- Option ids and labels must come from the filter's "options" list

DATE FILTER FORMAT:
- Range: {"type":"date", "filterType":"date_range", "value":{"start":"YYYY-MM-DD", "end":"YYYY-MM-DD"}}
- Single: {"type":"date", "filterType":"is_after|is_before|is_equal", "value":{"type":<filterType>, "date":"YYYY-MM-DD"}}
- Relative: {"type":"date", "filterType":"relative_time", "value":{"relativeTime":{"value":number, "unit":"days|weeks|months|years", "direction":"ago|from_now"}}}

Be thorough and precise in your analysis. Extract all relevant filters, even when they are only implied.
Use the exact IDs, labels, and structure from the available filters list."#;

const ADDITIONAL_TASKS: &str = r#"ADDITIONAL TASKS:
1. After extracting the filters, provide a structured explanation with two parts:
   a. A brief note on what parts of the query matched to filters (the "matched" section)
   b. A brief note on what parts couldn't be included and why (the "unmatched" section)
2. Create a concise, descriptive name for this search based on the key filter criteria (3-7 words).
   Examples: "Luxury Beach Homes", "Family-Friendly Suburbs", "Downtown Condos Under 500K"

Both explanation sections should be extremely concise (just a few words or a short phrase each).
No introductory text or phrases like "Based on your query." Direct and to the point."#;

const RESPONSE_FORMAT: &str = r#"YOUR RESPONSE FORMAT:
{
  "filters": [...array of filter objects based on schema above...],
  "explanation": {
    "matched": "Brief note on what matched",
    "unmatched": "Brief note on what didn't match"
  },
  "search_name": "Descriptive name for this search"
}"#;
