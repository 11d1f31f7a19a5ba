//! Catalog enrichment of admitted filters

use hearth_domain::{FilterDefinition, FilterInstance, ValueType};
use serde_json::{Map, Value};
use tracing::debug;

/// Copy catalog metadata onto a filter and resolve multiselect option ids
///
/// Fields the instance already carries (with a non-null value) are never
/// overwritten. For multiselect filters each selected value whose `id`
/// resolves against the definition's options is replaced by the full option
/// record, keeping a caller-supplied label when it differs from the catalog
/// label. Values whose id does not resolve are left untouched.
pub fn enrich(mut filter: FilterInstance, definition: &FilterDefinition) -> FilterInstance {
    for (name, value) in definition.metadata() {
        if !filter.has_field(name) {
            filter.extra.insert(name.to_string(), value);
        }
    }

    if definition.value_type == ValueType::Multiselect {
        if let Some(values) = filter.value.get_mut("values").and_then(Value::as_array_mut) {
            for selected in values.iter_mut() {
                resolve_option(selected, definition);
            }
        }
    }

    filter
}

fn option_id(value: &Value) -> Option<i64> {
    match value.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn resolve_option(selected: &mut Value, definition: &FilterDefinition) {
    let Some(option) = option_id(selected).and_then(|id| definition.option(id)) else {
        debug!("Leaving unresolved option {} on filter {}", selected, definition.id);
        return;
    };

    let caller_label = selected
        .get("label")
        .and_then(Value::as_str)
        .filter(|label| !label.is_empty() && *label != option.label)
        .map(str::to_string);

    let mut record = Map::new();
    record.insert("id".to_string(), Value::from(option.id));
    record.insert(
        "label".to_string(),
        Value::String(caller_label.unwrap_or_else(|| option.label.clone())),
    );
    *selected = Value::Object(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::{FilterCatalog, SourceType};
    use serde_json::json;

    fn amenities() -> FilterDefinition {
        FilterCatalog::builtin()
            .lookup(12, SourceType::Properties)
            .cloned()
            .unwrap()
    }

    fn instance(value: Value) -> FilterInstance {
        serde_json::from_value(json!({
            "id": 12,
            "type": "multiselect",
            "source_type": "properties",
            "label": "Amenities",
            "filterType": "contains_any",
            "value": value
        }))
        .unwrap()
    }

    #[test]
    fn test_option_id_resolves_to_full_record() {
        let enriched = enrich(instance(json!({"values": [{"id": 1}]})), &amenities());
        assert_eq!(enriched.value, json!({"values": [{"id": 1, "label": "Pool"}]}));
    }

    #[test]
    fn test_string_option_id_resolves() {
        let enriched = enrich(instance(json!({"values": [{"id": "2"}]})), &amenities());
        assert_eq!(enriched.value, json!({"values": [{"id": 2, "label": "Garage"}]}));
    }

    #[test]
    fn test_caller_label_is_kept() {
        let enriched = enrich(
            instance(json!({"values": [{"id": 1, "label": "Swimming pool"}]})),
            &amenities(),
        );
        assert_eq!(
            enriched.value,
            json!({"values": [{"id": 1, "label": "Swimming pool"}]})
        );
    }

    #[test]
    fn test_unresolvable_option_left_as_is() {
        let value = json!({"values": [{"id": 99, "label": "Helipad"}]});
        let enriched = enrich(instance(value.clone()), &amenities());
        assert_eq!(enriched.value, value);
    }

    #[test]
    fn test_metadata_copied_without_overwriting() {
        let mut filter = instance(json!({"values": []}));
        filter
            .extra
            .insert("description".to_string(), json!("Caller description"));
        filter.extra.insert("group".to_string(), Value::Null);

        let enriched = enrich(filter, &amenities());
        assert_eq!(enriched.extra["description"], "Caller description");
        // null counts as absent
        assert_eq!(enriched.extra["group"], "Features");
        assert_eq!(enriched.extra["options"][0]["label"], "Pool");
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let once = enrich(instance(json!({"values": [{"id": 3}]})), &amenities());
        let twice = enrich(once.clone(), &amenities());
        assert_eq!(once, twice);
    }
}
