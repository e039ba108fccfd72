//! Payload traversal and field mapping for JSON sources

use crate::adapters::RawItem;
use crate::sources::{FieldMap, Provenance};
use serde_json::{Map, Value};

/// Walks a dotted path through nested JSON objects
///
/// Returns `None` when a key is missing or a non-object is reached before
/// the path ends. Never fails.
pub fn extract_path<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Renders a scalar JSON value as text
///
/// Strings are kept as-is, numbers and booleans are formatted, and null,
/// arrays, and objects have no text form.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Builds an item from one payload record
///
/// Canonical fields are read from the keys named in `field_map` (or the
/// canonical name itself). Provenance tags come from the static source
/// options unless `field_map` names a payload key that holds a value.
pub fn map_record(record: &Map<String, Value>, field_map: &FieldMap, provenance: &Provenance) -> RawItem {
    let field = |name: &str| record.get(field_map.key_for(name)).and_then(value_to_text);
    let overridden = |key: &Option<String>| {
        key.as_deref()
            .and_then(|k| record.get(k))
            .and_then(value_to_text)
    };

    RawItem {
        title: field("title"),
        url: field("url"),
        published_at: field("published_at"),
        summary: field("summary"),
        content_type: overridden(&field_map.content_type)
            .unwrap_or_else(|| provenance.content_type.clone()),
        language: overridden(&field_map.language).or_else(|| provenance.language.clone()),
        region: overridden(&field_map.region).or_else(|| provenance.region.clone()),
    }
}
