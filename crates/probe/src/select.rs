//! Slicing, key projection, and predicate filtering over a resolved target.

use serde_json::{Map, Number, Value};

use crate::error::{ProbeError, Result};
use crate::expr::{truthy, Expr, Scope};

/// Half-open `[start, end)` slice of an array, clamped to its bounds.
/// Negative indices and steps are not supported.
pub fn slice_array(items: &[Value], start: Option<usize>, end: Option<usize>) -> Vec<Value> {
    let start = start.unwrap_or(0).min(items.len());
    let end = end.unwrap_or(items.len()).clamp(start, items.len());
    items[start..end].to_vec()
}

/// Keep only the requested keys that are present in the target, in the
/// target's insertion order. Absent keys are dropped silently; no null
/// entries are invented for them.
pub fn project_keys(map: &Map<String, Value>, keys: &[String]) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| keys.iter().any(|want| want == k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Filter a container by a predicate expression.
///
/// Arrays keep elements where the predicate holds over
/// (`item`, no key, `index`, `value` = item); objects keep entries where it
/// holds over (`item` = entry value, `key`, `index`, `value`). A predicate
/// that fails to evaluate aborts the whole filter with the error rather
/// than skipping the element.
pub fn filter(target: &Value, predicate: &Expr) -> Result<Value> {
    match target {
        Value::Array(items) => {
            let no_key = Value::Null;
            let mut kept = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let index_value = Value::Number(Number::from(index));
                let scope = Scope::new()
                    .bind("item", item)
                    .bind("key", &no_key)
                    .bind("index", &index_value)
                    .bind("value", item);
                if truthy(&predicate.eval(&scope)?) {
                    kept.push(item.clone());
                }
            }
            Ok(Value::Array(kept))
        }
        Value::Object(map) => {
            let mut kept = Map::new();
            for (index, (key, val)) in map.iter().enumerate() {
                let index_value = Value::Number(Number::from(index));
                let key_value = Value::String(key.clone());
                let scope = Scope::new()
                    .bind("item", val)
                    .bind("key", &key_value)
                    .bind("index", &index_value)
                    .bind("value", val);
                if truthy(&predicate.eval(&scope)?) {
                    kept.insert(key.clone(), val.clone());
                }
            }
            Ok(Value::Object(kept))
        }
        other => Err(ProbeError::type_mismatch(
            "array or object",
            crate::value::type_name(other),
        )),
    }
}
