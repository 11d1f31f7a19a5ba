//! Filter module - catalog definitions and the filter instances built from them

use crate::{SourceType, ValueType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One selectable option of a multiselect filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option identifier, unique within its filter
    pub id: i64,

    /// Display label
    pub label: String,
}

/// A catalog entry describing one available filter
///
/// Definitions are loaded once at startup and never mutated. The serialized
/// form is the one shown to the language model, so field names follow the
/// filter wire shape (`type` rather than `value_type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Identifier, unique within `source_type`
    pub id: i64,

    /// Display label
    pub label: String,

    /// Value type, which selects the validator
    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Optional refinement of the value type (e.g. "currency")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Dataset this filter applies to
    pub source_type: SourceType,

    /// Description shown to users and to the model
    #[serde(default)]
    pub description: String,

    /// Search hints for the model; never validated against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Lower bound hint for number filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper bound hint for number filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Option list (multiselect only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FilterOption>>,

    /// Alternative display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Help text for the filter editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Placeholder text for the filter editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Unit of measure ("USD", "sqft", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Group heading in the filter editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Icon name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl FilterDefinition {
    /// Create a bare definition; metadata is added with the `with_*` builders
    pub fn new(
        id: i64,
        label: impl Into<String>,
        value_type: ValueType,
        source_type: SourceType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            value_type,
            subtype: None,
            source_type,
            description: description.into(),
            aliases: Vec::new(),
            min: None,
            max: None,
            options: None,
            display_name: None,
            hint: None,
            placeholder: None,
            unit: None,
            group: None,
            icon: None,
        }
    }

    /// Set the search aliases
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Set the numeric bounds
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Set the option list from `(id, label)` pairs
    pub fn with_options(mut self, options: &[(i64, &str)]) -> Self {
        self.options = Some(
            options
                .iter()
                .map(|(id, label)| FilterOption {
                    id: *id,
                    label: label.to_string(),
                })
                .collect(),
        );
        self
    }

    /// Set the subtype
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Set the unit of measure
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the editor group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Look up an option by id
    pub fn option(&self, id: i64) -> Option<&FilterOption> {
        self.options.as_ref()?.iter().find(|o| o.id == id)
    }

    /// Descriptive metadata that may be copied onto a filter instance
    ///
    /// Only fields that are actually set are returned, in a stable order.
    pub fn metadata(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if !self.description.is_empty() {
            fields.push(("description", Value::String(self.description.clone())));
        }
        if let Some(options) = &self.options {
            if let Ok(value) = serde_json::to_value(options) {
                fields.push(("options", value));
            }
        }
        let optional = [
            ("subtype", &self.subtype),
            ("display_name", &self.display_name),
            ("hint", &self.hint),
            ("placeholder", &self.placeholder),
            ("unit", &self.unit),
            ("group", &self.group),
            ("icon", &self.icon),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                fields.push((name, Value::String(v.clone())));
            }
        }
        fields
    }
}

/// A single applied or candidate filter in wire shape
///
/// Instances are produced by validation and never partially applied: a
/// candidate either becomes a complete `FilterInstance` or is dropped.
/// Fields outside the core wire shape (enrichment metadata, caller-specific
/// fields) live in `extra` and survive serialization untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterInstance {
    /// Catalog id
    pub id: i64,

    /// Value type; must equal the definition's value type
    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Dataset this filter applies to
    pub source_type: SourceType,

    /// Display label
    pub label: String,

    /// Operator (wire name `filterType`); bool filters carry none
    #[serde(rename = "filterType", default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Type- and operator-dependent value
    pub value: Value,

    /// Unix seconds at which the filter was created or last updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Enrichment metadata and any other caller-supplied fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FilterInstance {
    /// Operator as a string slice, empty when the filter has none
    pub fn operator_str(&self) -> &str {
        self.operator.as_deref().unwrap_or("")
    }

    /// Composite identity `id:operator` used to deduplicate filter sets
    pub fn key(&self) -> String {
        format!("{}:{}", self.id, self.operator_str())
    }

    /// Whether an extra field is present with a non-null value
    pub fn has_field(&self, name: &str) -> bool {
        self.extra.get(name).is_some_and(|v| !v.is_null())
    }
}
