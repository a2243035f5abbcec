//! Recursive key/value pattern search.
//!
//! Search always walks the full, untruncated document: output bounding
//! happens later and never narrows what a pattern can see.

use regex::Regex;
use serde_json::Value;

/// Default cap on emitted hits.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// What a pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Key,
    Value,
    Both,
}

impl SearchTarget {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "key" | "keys" => Some(Self::Key),
            "value" | "values" => Some(Self::Value),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    fn wants_keys(self) -> bool {
        matches!(self, Self::Key | Self::Both)
    }

    fn wants_values(self) -> bool {
        matches!(self, Self::Value | Self::Both)
    }
}

/// Whether a hit matched an object key or a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Key,
    Value,
}

impl HitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Value => "value",
        }
    }
}

/// One search match, tagged with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub kind: HitKind,
    /// Dot notation for keys, bracket notation for array indices.
    pub path: String,
    pub key: String,
    pub value: Value,
}

/// Depth-first pre-order search over the whole tree, capped at
/// `max_results` emitted hits. When the cap is hit mid-traversal the true
/// total is unknown; callers must report "more may exist", never an exact
/// remainder.
pub fn search(
    value: &Value,
    pattern: &Regex,
    target: SearchTarget,
    max_results: usize,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    visit(value, pattern, target, max_results, "", "", &mut hits);
    hits
}

/// Scalar-to-text form used for value matching. `None` for containers and
/// for `null` (which only the literal pattern text "null" matches).
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_matches(value: &Value, pattern: &Regex) -> bool {
    if value.is_null() {
        return pattern.as_str() == "null";
    }
    value_text(value).is_some_and(|text| pattern.is_match(&text))
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn visit(
    value: &Value,
    pattern: &Regex,
    target: SearchTarget,
    max_results: usize,
    path: &str,
    key: &str,
    hits: &mut Vec<SearchHit>,
) {
    if hits.len() >= max_results {
        return;
    }
    match value {
        Value::Object(map) => {
            for (entry_key, entry_value) in map {
                if hits.len() >= max_results {
                    return;
                }
                let entry_path = join_key(path, entry_key);
                if target.wants_keys() && pattern.is_match(entry_key) {
                    hits.push(SearchHit {
                        kind: HitKind::Key,
                        path: entry_path.clone(),
                        key: entry_key.clone(),
                        value: entry_value.clone(),
                    });
                }
                if hits.len() < max_results
                    && target.wants_values()
                    && value_matches(entry_value, pattern)
                {
                    hits.push(SearchHit {
                        kind: HitKind::Value,
                        path: entry_path.clone(),
                        key: entry_key.clone(),
                        value: entry_value.clone(),
                    });
                }
                // Matches never stop descent.
                if entry_value.is_object() || entry_value.is_array() {
                    visit(
                        entry_value,
                        pattern,
                        target,
                        max_results,
                        &entry_path,
                        entry_key,
                        hits,
                    );
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if hits.len() >= max_results {
                    return;
                }
                let item_path = format!("{path}[{index}]");
                let item_key = index.to_string();
                if item.is_object() || item.is_array() {
                    visit(item, pattern, target, max_results, &item_path, &item_key, hits);
                } else if target.wants_values() && value_matches(item, pattern) {
                    hits.push(SearchHit {
                        kind: HitKind::Value,
                        path: item_path,
                        key: item_key,
                        value: item.clone(),
                    });
                }
            }
        }
        scalar => {
            // Bare scalar root.
            if target.wants_values() && value_matches(scalar, pattern) {
                hits.push(SearchHit {
                    kind: HitKind::Value,
                    path: path.to_string(),
                    key: key.to_string(),
                    value: scalar.clone(),
                });
            }
        }
    }
}
