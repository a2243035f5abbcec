//! Output budget enforcement.
//!
//! [`bound`] turns an arbitrarily large value into a display-sized one
//! without ever changing a node's type: strings are clipped, arrays keep
//! their first element, objects their leading keys, and every cut is
//! replaced with a marker stating exactly how much was elided. It runs
//! once, on the final payload of a request; search and filter logic
//! always see the untruncated document.
//!
//! [`render`] serializes the bounded value and rewrites the reserved
//! item/property markers from quoted-string form into bare text, so the
//! emitted block reads naturally. The clipped-string marker stays inside
//! its string on purpose: a decorated string is still a string.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Default serialized-output budget, in characters.
pub const DEFAULT_MAX_OUTPUT_LEN: usize = 25_000;

/// Strings longer than this are clipped during bounding.
pub const MAX_STRING_LEN: usize = 200;

/// Objects keep at most this many keys during bounding.
const MAX_OBJECT_KEYS: usize = 200;

/// Sentinel key carrying the elided-properties marker.
const ELLIPSIS_KEY: &str = "...";

fn items_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\.\.\.\d+ more items$").unwrap())
}

fn chars_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.\.\.\d+ more characters$").unwrap())
}

fn quoted_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""(\.\.\.\d+ more (?:items|properties))""#).unwrap())
}

/// Serialized length of a value, in characters, as [`render`] would emit it
/// before marker rewriting.
pub fn serialized_len(value: &Value) -> usize {
    serde_json::to_string_pretty(value)
        .map(|s| s.chars().count())
        .unwrap_or(usize::MAX)
}

/// Reduce `value` so its serialized form fits `max_output_len` characters.
///
/// Values already within budget pass through untouched, with no markers
/// anywhere. Bounding is idempotent: markers from an earlier pass are
/// recognized and left alone rather than truncated again.
pub fn bound(value: &Value, max_output_len: usize) -> Value {
    let len = serialized_len(value);
    if len <= max_output_len {
        return value.clone();
    }
    log::debug!("bounding output: {len} chars over budget of {max_output_len}");
    shrink(value)
}

fn shrink(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let char_len = s.chars().count();
            if char_len > MAX_STRING_LEN && !chars_marker_re().is_match(s) {
                let head: String = s.chars().take(MAX_STRING_LEN).collect();
                Value::String(format!(
                    "{head}...{} more characters",
                    char_len - MAX_STRING_LEN
                ))
            } else {
                value.clone()
            }
        }
        Value::Array(items) => {
            // An array already reduced to [head, marker] stays as it is.
            if items.len() == 2 {
                if let Some(Value::String(last)) = items.last() {
                    if items_marker_re().is_match(last) {
                        return Value::Array(vec![shrink(&items[0]), items[1].clone()]);
                    }
                }
            }
            if items.len() <= 1 {
                Value::Array(items.iter().map(shrink).collect())
            } else {
                Value::Array(vec![
                    shrink(&items[0]),
                    Value::String(format!("...{} more items", items.len() - 1)),
                ])
            }
        }
        Value::Object(map) => {
            let real_keys = map.keys().filter(|k| k.as_str() != ELLIPSIS_KEY).count();
            let mut out = Map::new();
            if real_keys <= MAX_OBJECT_KEYS {
                for (key, val) in map {
                    out.insert(key.clone(), shrink(val));
                }
            } else {
                for (key, val) in map.iter().take(MAX_OBJECT_KEYS) {
                    out.insert(key.clone(), shrink(val));
                }
                out.insert(
                    ELLIPSIS_KEY.to_string(),
                    Value::String(format!("...{} more properties", map.len() - MAX_OBJECT_KEYS)),
                );
            }
            Value::Object(out)
        }
        scalar => scalar.clone(),
    }
}

/// Serialize a (typically bounded) value for display, unquoting the
/// reserved item/property markers.
pub fn render(value: &Value) -> String {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    quoted_marker_re().replace_all(&text, "$1").into_owned()
}
