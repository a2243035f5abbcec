//! Structural sampling: depth- and breadth-bounded overviews.
//!
//! The output is an informational projection, never a valid substitute for
//! the document: marker strings like `"[...5 more items]"` are injected
//! into array positions and sentinel keys into objects.

use serde_json::{Map, Value};

use crate::value::type_name;

/// Marker emitted in place of structure below the depth limit.
pub const DEPTH_LIMIT_MARKER: &str = "[...depth limit reached...]";

/// How many leading array elements a sample keeps.
const ARRAY_HEAD: usize = 3;

/// Knobs for [`sample`].
#[derive(Debug, Clone, Copy)]
pub struct SampleOptions {
    /// Container levels to expand before emitting the depth-limit marker.
    pub max_depth: usize,
    /// Object keys to keep per object; `None` keeps all of them.
    pub max_keys: Option<usize>,
    /// When false, arrays are expanded in full instead of keeping the
    /// leading elements plus a count marker.
    pub sample_arrays: bool,
    /// When true, scalar leaves are shown as their type name; otherwise as
    /// an opaque `"..."`.
    pub include_types: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_keys: None,
            sample_arrays: true,
            include_types: true,
        }
    }
}

/// Produce a structural sample of `value`.
///
/// Containers are expanded (up to `max_depth` levels), scalars are
/// described: `null` passes through verbatim, every other scalar is
/// replaced by its type name. Deterministic and read-only.
pub fn sample(value: &Value, options: &SampleOptions) -> Value {
    sample_at(value, options, 0)
}

fn sample_at(value: &Value, options: &SampleOptions, depth: usize) -> Value {
    if depth > options.max_depth {
        return Value::String(DEPTH_LIMIT_MARKER.to_string());
    }
    match value {
        Value::Null => Value::Null,
        Value::Array(items) => {
            let keep = if options.sample_arrays {
                ARRAY_HEAD.min(items.len())
            } else {
                items.len()
            };
            let mut out: Vec<Value> = items[..keep]
                .iter()
                .map(|item| sample_at(item, options, depth + 1))
                .collect();
            if items.len() > keep {
                out.push(Value::String(format!(
                    "[...{} more items]",
                    items.len() - keep
                )));
            }
            Value::Array(out)
        }
        Value::Object(map) => {
            let keep = options.max_keys.unwrap_or(map.len()).min(map.len());
            let mut out = Map::new();
            for (key, val) in map.iter().take(keep) {
                out.insert(key.clone(), sample_at(val, options, depth + 1));
            }
            if map.len() > keep {
                out.insert(
                    format!("[...{} more keys]", map.len() - keep),
                    Value::String("...".to_string()),
                );
            }
            Value::Object(out)
        }
        scalar => {
            if options.include_types {
                Value::String(type_name(scalar).to_string())
            } else {
                Value::String("...".to_string())
            }
        }
    }
}

/// Size and shape summary of a value, for overview responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_nodes: usize,
    pub objects: usize,
    pub arrays: usize,
    pub strings: usize,
    pub numbers: usize,
    pub booleans: usize,
    pub nulls: usize,
    pub max_depth: usize,
    pub largest_array: usize,
    pub largest_object: usize,
}

/// Walk the whole tree once and count what it holds.
pub fn stats(value: &Value) -> Stats {
    let mut out = Stats::default();
    collect_stats(value, 0, &mut out);
    out
}

fn collect_stats(value: &Value, depth: usize, out: &mut Stats) {
    out.total_nodes += 1;
    out.max_depth = out.max_depth.max(depth);
    match value {
        Value::Null => out.nulls += 1,
        Value::Bool(_) => out.booleans += 1,
        Value::Number(_) => out.numbers += 1,
        Value::String(_) => out.strings += 1,
        Value::Array(items) => {
            out.arrays += 1;
            out.largest_array = out.largest_array.max(items.len());
            for item in items {
                collect_stats(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            out.objects += 1;
            out.largest_object = out.largest_object.max(map.len());
            for val in map.values() {
                collect_stats(val, depth + 1, out);
            }
        }
    }
}
