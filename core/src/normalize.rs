//! Coercion of loosely shaped `actions_taken` values into the canonical
//! sequence of [`ActionEntry`].
//!
//! Whatever a producer emits for the trail (typed entries, bare strings,
//! ad hoc mappings, or something else entirely) comes out as a list of
//! well-formed entries. Malformed input becomes a sentinel entry rather than
//! an error, so the envelope keeps its shape.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::agent::{ActionEntry, ActionKind};

pub const INVALID_ACTION_ITEM: &str = "invalid_action_item";
pub const INVALID_ACTIONS_SHAPE: &str = "invalid_actions_shape";

/// JSON type name used in sentinel details and tool errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize a whole `actions_taken` value.
pub fn normalize_actions(value: Value) -> Vec<ActionEntry> {
    match value {
        Value::Array(items) => items.into_iter().map(normalize_action_item).collect(),
        other => vec![sentinel(INVALID_ACTIONS_SHAPE, &other)],
    }
}

/// Normalize one element of `actions_taken`.
pub fn normalize_action_item(value: Value) -> ActionEntry {
    match value {
        Value::String(name) => ActionEntry::event(name),
        Value::Object(fields) => {
            coerce_mapping(&fields).unwrap_or_else(|| sentinel(INVALID_ACTION_ITEM, &Value::Object(fields)))
        }
        other => sentinel(INVALID_ACTION_ITEM, &other),
    }
}

/// `deserialize_with` adapter for envelope decoding.
pub fn deserialize_actions<'de, D>(deserializer: D) -> Result<Vec<ActionEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_actions(value))
}

fn sentinel(name: &str, offending: &Value) -> ActionEntry {
    ActionEntry::event(name)
        .with_ok(false)
        .with_detail("observed_type", json_type_name(offending))
}

/// Present-and-not-null lookup; `null` counts as absent.
fn field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn coerce_mapping(fields: &Map<String, Value>) -> Option<ActionEntry> {
    let name = field(fields, "name")?.as_str()?.to_string();

    let kind = match field(fields, "kind") {
        None => ActionKind::Event,
        Some(value) => ActionKind::parse(value.as_str()?)?,
    };

    let ok = match field(fields, "ok") {
        None => true,
        Some(value) => value.as_bool()?,
    };

    let duration_ms = match field(fields, "duration_ms").or_else(|| field(fields, "ms")) {
        None => 0,
        Some(value) => coerce_duration(value)?,
    };

    let details = match field(fields, "details") {
        None => Map::new(),
        Some(value) => value.as_object()?.clone(),
    };

    Some(ActionEntry {
        kind,
        name,
        ok,
        duration_ms,
        details,
    })
}

fn coerce_duration(value: &Value) -> Option<u64> {
    if let Some(ms) = value.as_u64() {
        return Some(ms);
    }
    value
        .as_f64()
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .map(|ms| ms.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_entries_pass_through() {
        let entry = ActionEntry::tool("analytics_query", false, 12).with_detail("date", "2026-01-01");
        let value = serde_json::to_value(vec![entry.clone()]).unwrap();
        assert_eq!(normalize_actions(value), vec![entry]);
    }

    #[test]
    fn bare_string_becomes_event() {
        let actions = normalize_actions(json!(["graph_start"]));
        assert_eq!(actions, vec![ActionEntry::event("graph_start")]);
        assert!(actions[0].ok);
        assert_eq!(actions[0].duration_ms, 0);
    }

    #[test]
    fn loose_mapping_is_coerced_with_defaults() {
        let actions = normalize_actions(json!([
            {"kind": "tool", "name": "analytics_query", "ms": 7, "details": {"date": "2026-01-01"}},
            {"name": "graph_finalize"}
        ]));
        assert_eq!(actions[0].kind, ActionKind::Tool);
        assert_eq!(actions[0].duration_ms, 7);
        assert_eq!(actions[0].details["date"], "2026-01-01");
        assert!(actions[0].ok);
        assert_eq!(actions[1], ActionEntry::event("graph_finalize"));
    }

    #[test]
    fn fractional_duration_is_rounded() {
        let actions = normalize_actions(json!([{"kind": "tool", "name": "t", "duration_ms": 3.6}]));
        assert_eq!(actions[0].duration_ms, 4);
    }

    #[test]
    fn wrong_item_types_become_sentinels() {
        let actions = normalize_actions(json!([42, true, null, ["nested"]]));
        let observed: Vec<&str> = actions
            .iter()
            .map(|a| {
                assert_eq!(a.name, INVALID_ACTION_ITEM);
                assert_eq!(a.kind, ActionKind::Event);
                assert!(!a.ok);
                a.details["observed_type"].as_str().unwrap()
            })
            .collect();
        assert_eq!(observed, vec!["number", "boolean", "null", "array"]);
    }

    #[test]
    fn malformed_mappings_become_sentinels() {
        let actions = normalize_actions(json!([
            {"kind": "route"},
            {"kind": "telepathy", "name": "x"},
            {"kind": "tool", "name": "x", "ok": "yes"},
            {"kind": "tool", "name": "x", "duration_ms": -5},
            {"kind": "tool", "name": "x", "details": "none"},
            {"kind": "tool", "name": 7}
        ]));
        assert_eq!(actions.len(), 6);
        for action in &actions {
            assert_eq!(action.name, INVALID_ACTION_ITEM);
            assert_eq!(action.details["observed_type"], "object");
        }
    }

    #[test]
    fn non_sequence_becomes_single_shape_sentinel() {
        for value in [json!("graph_start"), json!({"name": "x"}), json!(3), Value::Null] {
            let actions = normalize_actions(value);
            assert_eq!(actions.len(), 1);
            assert_eq!(actions[0].name, INVALID_ACTIONS_SHAPE);
            assert!(!actions[0].ok);
        }
    }

    #[test]
    fn normalizing_twice_is_identity() {
        let once = normalize_actions(json!([
            "graph_start",
            {"kind": "tool", "name": "analytics_query", "ms": 3},
            17,
            {"kind": "bogus", "name": "x"}
        ]));
        let twice = normalize_actions(serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }
}
