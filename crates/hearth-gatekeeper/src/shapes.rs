//! Per-type value validators
//!
//! Each value type has its own operator vocabulary and value shape. The
//! dispatcher in [`validate_value`] matches on the value type and hands the
//! candidate's operator and value to that type's validator, which returns the
//! (possibly repaired) value or a rejection.

use crate::RejectionReason;
use chrono::NaiveDate;
use hearth_domain::ValueType;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::debug;

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));

/// Operators of number filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberOp {
    /// `{min, max}`
    Range,
    /// `{gt: n}`
    Gt,
    /// `{gte: n}`
    Gte,
    /// `{lt: n}`
    Lt,
    /// `{lte: n}`
    Lte,
    /// bare number
    Eq,
    /// `{neq: n}`
    Neq,
}

impl NumberOp {
    /// All number operators
    pub const ALL: [NumberOp; 7] = [
        NumberOp::Range,
        NumberOp::Gt,
        NumberOp::Gte,
        NumberOp::Lt,
        NumberOp::Lte,
        NumberOp::Eq,
        NumberOp::Neq,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberOp::Range => "range",
            NumberOp::Gt => "gt",
            NumberOp::Gte => "gte",
            NumberOp::Lt => "lt",
            NumberOp::Lte => "lte",
            NumberOp::Eq => "eq",
            NumberOp::Neq => "neq",
        }
    }

    /// Parse from the wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

/// Operators of text filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    /// Substring match
    Contains,
    /// Prefix match
    StartsWith,
    /// Suffix match
    EndsWith,
    /// Exact match
    Equals,
    /// Negated exact match
    NotEquals,
    /// Negated substring match
    NotContains,
    /// Match any of several strings
    AnyOf,
}

impl TextOp {
    /// All text operators
    pub const ALL: [TextOp; 7] = [
        TextOp::Contains,
        TextOp::StartsWith,
        TextOp::EndsWith,
        TextOp::Equals,
        TextOp::NotEquals,
        TextOp::NotContains,
        TextOp::AnyOf,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TextOp::Contains => "contains",
            TextOp::StartsWith => "starts_with",
            TextOp::EndsWith => "ends_with",
            TextOp::Equals => "equals",
            TextOp::NotEquals => "not_equals",
            TextOp::NotContains => "not_contains",
            TextOp::AnyOf => "any_of",
        }
    }

    /// Parse from the wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

/// Operators of date filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
    /// `{start, end}`
    DateRange,
    /// Strictly after a date
    IsAfter,
    /// Strictly before a date
    IsBefore,
    /// On a date
    IsEqual,
    /// Relative span such as "3 months ago"
    RelativeTime,
}

impl DateOp {
    /// All date operators
    pub const ALL: [DateOp; 5] = [
        DateOp::DateRange,
        DateOp::IsAfter,
        DateOp::IsBefore,
        DateOp::IsEqual,
        DateOp::RelativeTime,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DateOp::DateRange => "date_range",
            DateOp::IsAfter => "is_after",
            DateOp::IsBefore => "is_before",
            DateOp::IsEqual => "is_equal",
            DateOp::RelativeTime => "relative_time",
        }
    }

    /// Parse from the wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

/// Operators of multiselect filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiselectOp {
    /// Record has at least one of the options
    ContainsAny,
    /// Record has none of the options
    ContainsNone,
}

impl MultiselectOp {
    /// All multiselect operators
    pub const ALL: [MultiselectOp; 2] = [MultiselectOp::ContainsAny, MultiselectOp::ContainsNone];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            MultiselectOp::ContainsAny => "contains_any",
            MultiselectOp::ContainsNone => "contains_none",
        }
    }

    /// Parse from the wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

/// Operator vocabulary of a value type (empty for bool)
pub fn operators_for(value_type: ValueType) -> Vec<&'static str> {
    match value_type {
        ValueType::Number => NumberOp::ALL.iter().map(NumberOp::as_str).collect(),
        ValueType::Text => TextOp::ALL.iter().map(TextOp::as_str).collect(),
        ValueType::Bool => Vec::new(),
        ValueType::Date => DateOp::ALL.iter().map(DateOp::as_str).collect(),
        ValueType::Multiselect => MultiselectOp::ALL.iter().map(MultiselectOp::as_str).collect(),
    }
}

/// Validate (and possibly repair) a value for its type and operator
pub(crate) fn validate_value(
    value_type: ValueType,
    operator: Option<&str>,
    value: Value,
) -> Result<Value, RejectionReason> {
    if value_type == ValueType::Bool {
        return validate_bool(value);
    }

    let operator = operator.ok_or(RejectionReason::MissingField("filterType"))?;
    let unknown = || RejectionReason::InvalidOperator {
        value_type,
        operator: operator.to_string(),
    };

    match value_type {
        ValueType::Number => validate_number(NumberOp::parse(operator).ok_or_else(unknown)?, value),
        ValueType::Text => validate_text(TextOp::parse(operator).ok_or_else(unknown)?, value),
        ValueType::Date => validate_date(DateOp::parse(operator).ok_or_else(unknown)?, value),
        ValueType::Multiselect => {
            validate_multiselect(MultiselectOp::parse(operator).ok_or_else(unknown)?, value)
        }
        ValueType::Bool => validate_bool(value),
    }
}

fn into_object(value_type: ValueType, value: Value) -> Result<Map<String, Value>, RejectionReason> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RejectionReason::invalid(
            value_type,
            format!("expected an object, got {}", other),
        )),
    }
}

/// A JSON number, or a numeric string converted to one
///
/// Integers stay integers; other numeric strings become floats. Non-finite
/// values are not numbers.
pub(crate) fn numeric(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Some(Value::from(n));
            }
            s.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

fn validate_number(op: NumberOp, value: Value) -> Result<Value, RejectionReason> {
    let invalid = |detail: &str| RejectionReason::invalid(ValueType::Number, detail);

    match op {
        NumberOp::Eq => numeric(&value).ok_or_else(|| invalid("eq expects a bare number")),
        NumberOp::Range => {
            let mut range = into_object(ValueType::Number, value)?;
            let (min, max) = match (
                range.get("min").and_then(numeric),
                range.get("max").and_then(numeric),
            ) {
                (Some(min), Some(max)) => (min, max),
                _ => return Err(invalid("range expects numeric min and max")),
            };
            if min.as_f64() > max.as_f64() {
                debug!("Swapping inverted range bounds {} > {}", min, max);
                range.insert("min".to_string(), max);
                range.insert("max".to_string(), min);
            } else {
                range.insert("min".to_string(), min);
                range.insert("max".to_string(), max);
            }
            Ok(Value::Object(range))
        }
        _ => {
            let key = op.as_str();
            // Models often emit the bare comparand; wrap it under the operator key
            let value = match numeric(&value) {
                Some(n) => {
                    debug!("Wrapping bare number {} as {{\"{}\": ...}}", n, key);
                    json!({ key: n })
                }
                None => value,
            };
            let mut comparison = into_object(ValueType::Number, value)?;
            if let Some(n) = comparison.get(key).and_then(numeric) {
                comparison.insert(key.to_string(), n);
                Ok(Value::Object(comparison))
            } else {
                Err(RejectionReason::invalid(
                    ValueType::Number,
                    format!("{} expects {{\"{}\": number}}", key, key),
                ))
            }
        }
    }
}

fn validate_text(op: TextOp, value: Value) -> Result<Value, RejectionReason> {
    let text = into_object(ValueType::Text, value)?;
    let declared = text.get("type").and_then(Value::as_str);

    if declared != Some(op.as_str()) {
        return Err(RejectionReason::invalid(
            ValueType::Text,
            format!("value.type must be '{}'", op.as_str()),
        ));
    }

    let well_formed = match op {
        TextOp::AnyOf => text
            .get("values")
            .and_then(Value::as_array)
            .is_some_and(|values| values.iter().all(Value::is_string)),
        _ => text.get("text").is_some_and(Value::is_string),
    };

    if well_formed {
        Ok(Value::Object(text))
    } else if op == TextOp::AnyOf {
        Err(RejectionReason::invalid(ValueType::Text, "any_of expects values: [string]"))
    } else {
        Err(RejectionReason::invalid(ValueType::Text, "expected a string 'text'"))
    }
}

fn validate_bool(value: Value) -> Result<Value, RejectionReason> {
    match &value {
        Value::Bool(true) => Ok(Value::String("yes".to_string())),
        Value::Bool(false) => Ok(Value::String("no".to_string())),
        Value::String(s) => match s.as_str() {
            "yes" | "true" => Ok(Value::String("yes".to_string())),
            "no" | "false" => Ok(Value::String("no".to_string())),
            _ => Err(RejectionReason::invalid(
                ValueType::Bool,
                format!("expected \"yes\" or \"no\", got \"{}\"", s),
            )),
        },
        other => Err(RejectionReason::invalid(
            ValueType::Bool,
            format!("expected \"yes\" or \"no\", got {}", other),
        )),
    }
}

/// Turn a numeric-string `relativeTime.value` into a number
fn normalize_relative_amount(date: &mut Map<String, Value>) {
    if let Some(Value::Object(relative)) = date.get_mut("relativeTime") {
        if let Some(n) = relative.get("value").and_then(numeric) {
            relative.insert("value".to_string(), n);
        }
    }
}

/// `YYYY-MM-DD` that is also a real calendar date
pub(crate) fn is_valid_date(date: &str) -> bool {
    DATE_SHAPE.is_match(date) && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

fn date_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str).filter(|d| is_valid_date(d))
}

fn validate_date(op: DateOp, value: Value) -> Result<Value, RejectionReason> {
    let mut date = into_object(ValueType::Date, value)?;

    if op == DateOp::RelativeTime {
        normalize_relative_amount(&mut date);
    }

    let ok = match op {
        DateOp::DateRange => {
            date_field(&date, "start").is_some() && date_field(&date, "end").is_some()
        }
        DateOp::RelativeTime => date
            .get("relativeTime")
            .and_then(Value::as_object)
            .is_some_and(|relative| {
                relative.get("value").is_some_and(Value::is_number)
                    && relative
                        .get("unit")
                        .and_then(Value::as_str)
                        .is_some_and(|u| matches!(u, "days" | "weeks" | "months" | "years"))
                    && relative
                        .get("direction")
                        .and_then(Value::as_str)
                        .is_some_and(|d| matches!(d, "ago" | "from_now"))
            }),
        _ => {
            date.get("type").and_then(Value::as_str) == Some(op.as_str())
                && date_field(&date, "date").is_some()
        }
    };

    if ok {
        Ok(Value::Object(date))
    } else {
        Err(RejectionReason::invalid(
            ValueType::Date,
            format!("value does not match the {} shape", op.as_str()),
        ))
    }
}

fn validate_multiselect(_op: MultiselectOp, value: Value) -> Result<Value, RejectionReason> {
    let selection = into_object(ValueType::Multiselect, value)?;

    let values = selection
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| RejectionReason::invalid(ValueType::Multiselect, "expected values: [...]"))?;

    let complete = values.iter().all(|v| {
        let present = |key: &str| v.get(key).is_some_and(|f| !f.is_null());
        present("id") && present("label")
    });

    if complete {
        Ok(Value::Object(selection))
    } else {
        Err(RejectionReason::invalid(
            ValueType::Multiselect,
            "every selected value needs an id and a label",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(op: &str, value: Value) -> Result<Value, RejectionReason> {
        validate_value(ValueType::Number, Some(op), value)
    }

    #[test]
    fn test_number_bare_comparand_is_wrapped() {
        assert_eq!(number("lt", json!(100000)).unwrap(), json!({"lt": 100000}));
        assert_eq!(number("gte", json!(3)).unwrap(), json!({"gte": 3}));
    }

    #[test]
    fn test_number_neq_bare_value_is_wrapped() {
        assert_eq!(number("neq", json!(0)).unwrap(), json!({"neq": 0}));
        // and the wrapped form is accepted as-is
        assert_eq!(number("neq", json!({"neq": 0})).unwrap(), json!({"neq": 0}));
    }

    #[test]
    fn test_number_comparison_requires_operator_key() {
        assert!(number("gt", json!({"lt": 5})).is_err());
        assert!(number("gt", json!({"gt": "five"})).is_err());
        assert!(number("gt", json!({"gt": null})).is_err());
    }

    #[test]
    fn test_number_numeric_strings_are_normalized() {
        assert_eq!(number("eq", json!("3")).unwrap(), json!(3));
        assert_eq!(number("lt", json!("100000")).unwrap(), json!({"lt": 100000}));
        assert_eq!(number("gte", json!({"gte": " 2.5"})).unwrap(), json!({"gte": 2.5}));
        assert_eq!(
            number("range", json!({"min": "1", "max": "9"})).unwrap(),
            json!({"min": 1, "max": 9})
        );
        assert_eq!(
            number("range", json!({"min": "900", "max": 100})).unwrap(),
            json!({"min": 100, "max": 900})
        );
        assert!(number("eq", json!("three")).is_err());
        assert!(number("eq", json!("NaN")).is_err());
        assert!(number("lt", json!("")).is_err());
    }

    #[test]
    fn test_number_range_swaps_inverted_bounds() {
        let repaired = number("range", json!({"min": 500000, "max": 200000})).unwrap();
        assert_eq!(repaired, json!({"min": 200000, "max": 500000}));
    }

    #[test]
    fn test_number_range_requires_both_bounds() {
        assert!(number("range", json!({"min": 1})).is_err());
        assert!(number("range", json!({"min": 1, "max": "nine"})).is_err());
        assert!(number("range", json!(5)).is_err());
    }

    #[test]
    fn test_number_eq_expects_bare_number() {
        assert_eq!(number("eq", json!(3)).unwrap(), json!(3));
        assert!(number("eq", json!({"eq": 3})).is_err());
    }

    #[test]
    fn test_number_unknown_operator() {
        assert!(matches!(
            number("between", json!({"min": 1, "max": 2})),
            Err(RejectionReason::InvalidOperator { .. })
        ));
        assert!(matches!(
            validate_value(ValueType::Number, None, json!(1)),
            Err(RejectionReason::MissingField("filterType"))
        ));
    }

    #[test]
    fn test_text_shapes() {
        let ok = validate_value(
            ValueType::Text,
            Some("contains"),
            json!({"type": "contains", "text": "Main"}),
        );
        assert!(ok.is_ok());

        let any_of = validate_value(
            ValueType::Text,
            Some("any_of"),
            json!({"type": "any_of", "values": ["Austin", "Dallas"]}),
        );
        assert!(any_of.is_ok());

        // type must echo the operator
        assert!(validate_value(
            ValueType::Text,
            Some("contains"),
            json!({"type": "equals", "text": "Main"})
        )
        .is_err());
        // any_of values must all be strings
        assert!(validate_value(
            ValueType::Text,
            Some("any_of"),
            json!({"type": "any_of", "values": ["Austin", 7]})
        )
        .is_err());
        assert!(validate_value(ValueType::Text, Some("contains"), json!("Main")).is_err());
    }

    #[test]
    fn test_bool_normalization() {
        let bool_value = |v: Value| validate_value(ValueType::Bool, None, v);
        assert_eq!(bool_value(json!(true)).unwrap(), json!("yes"));
        assert_eq!(bool_value(json!("true")).unwrap(), json!("yes"));
        assert_eq!(bool_value(json!(false)).unwrap(), json!("no"));
        assert_eq!(bool_value(json!("false")).unwrap(), json!("no"));
        assert_eq!(bool_value(json!("no")).unwrap(), json!("no"));
        assert!(bool_value(json!("maybe")).is_err());
        assert!(bool_value(json!(1)).is_err());
        assert!(bool_value(json!("Yes")).is_err());
    }

    #[test]
    fn test_bool_ignores_operator() {
        assert!(validate_value(ValueType::Bool, Some("eq"), json!("yes")).is_ok());
    }

    #[test]
    fn test_calendar_dates() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("2023-02-30"));
        assert!(!is_valid_date("2023-2-3"));
        assert!(!is_valid_date("2023-13-01"));
        assert!(!is_valid_date("20230101"));
    }

    #[test]
    fn test_date_shapes() {
        let date = |op: &str, v: Value| validate_value(ValueType::Date, Some(op), v);

        assert!(date("date_range", json!({"start": "2023-01-01", "end": "2023-12-31"})).is_ok());
        assert!(date("date_range", json!({"start": "2023-01-01", "end": "2023-02-30"})).is_err());
        assert!(date("is_after", json!({"type": "is_after", "date": "2020-06-15"})).is_ok());
        assert!(date("is_after", json!({"type": "is_before", "date": "2020-06-15"})).is_err());
        assert!(date("is_equal", json!({"type": "is_equal", "date": "2023-02-30"})).is_err());
        assert!(date(
            "relative_time",
            json!({"relativeTime": {"value": 6, "unit": "months", "direction": "ago"}})
        )
        .is_ok());
        assert!(date(
            "relative_time",
            json!({"relativeTime": {"value": 6, "unit": "fortnights", "direction": "ago"}})
        )
        .is_err());
        assert!(date(
            "relative_time",
            json!({"relativeTime": {"value": "six", "unit": "days", "direction": "ago"}})
        )
        .is_err());
        assert_eq!(
            date(
                "relative_time",
                json!({"relativeTime": {"value": "6", "unit": "days", "direction": "ago"}})
            )
            .unwrap(),
            json!({"relativeTime": {"value": 6, "unit": "days", "direction": "ago"}})
        );
    }

    #[test]
    fn test_multiselect_shapes() {
        let pick = |v: Value| validate_value(ValueType::Multiselect, Some("contains_any"), v);

        assert!(pick(json!({"values": [{"id": 1, "label": "Pool"}]})).is_ok());
        assert!(pick(json!({"values": []})).is_ok());
        assert!(pick(json!({"values": [{"id": 1}]})).is_err());
        assert!(pick(json!({"values": [{"label": "Pool"}]})).is_err());
        assert!(pick(json!([{"id": 1, "label": "Pool"}])).is_err());
        assert!(validate_value(
            ValueType::Multiselect,
            Some("contains_all"),
            json!({"values": []})
        )
        .is_err());
    }

    #[test]
    fn test_operator_vocabulary() {
        assert_eq!(operators_for(ValueType::Number).len(), 7);
        assert!(operators_for(ValueType::Bool).is_empty());
        assert_eq!(operators_for(ValueType::Multiselect), vec!["contains_any", "contains_none"]);
        for op in DateOp::ALL {
            assert_eq!(DateOp::parse(op.as_str()), Some(op));
        }
    }
}
