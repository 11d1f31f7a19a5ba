//! Value types and source types - the two closed vocabularies of the catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value type of a filter
///
/// Every filter definition declares exactly one value type, and the value type
/// selects which validator a candidate filter is checked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Numeric comparison or range
    Number,

    /// Free-text matching
    Text,

    /// Yes/no flag
    Bool,

    /// Calendar date, date range or relative time span
    Date,

    /// One or more options out of a fixed option list
    Multiselect,
}

impl ValueType {
    /// All value types, in catalog order
    pub const ALL: [ValueType; 5] = [
        ValueType::Number,
        ValueType::Text,
        ValueType::Bool,
        ValueType::Date,
        ValueType::Multiselect,
    ];

    /// Get the wire name of the value type
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Bool => "bool",
            ValueType::Date => "date",
            ValueType::Multiselect => "multiselect",
        }
    }

    /// Parse a value type from its wire name
    ///
    /// Matching is exact: the model must use the catalog vocabulary.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "number" => Some(ValueType::Number),
            "text" => Some(ValueType::Text),
            "bool" => Some(ValueType::Bool),
            "date" => Some(ValueType::Date),
            "multiselect" => Some(ValueType::Multiselect),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid value type: {}", s))
    }
}

/// The dataset a filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Property records
    Properties,

    /// Contact (people) records
    Contacts,
}

impl SourceType {
    /// Get the wire name of the source type
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Properties => "properties",
            SourceType::Contacts => "contacts",
        }
    }

    /// Parse a source type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "properties" => Some(SourceType::Properties),
            "contacts" => Some(SourceType::Contacts),
            _ => None,
        }
    }

    /// Search category reported for extractions over this source type
    pub fn search_type(&self) -> &'static str {
        match self {
            SourceType::Properties => "multiple_properties",
            SourceType::Contacts => "multiple_people",
        }
    }

    /// Human-readable search label ("Property Search", "Contact Search")
    pub fn search_label(&self) -> &'static str {
        match self {
            SourceType::Properties => "Property Search",
            SourceType::Contacts => "Contact Search",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid source type: {}", s))
    }
}
