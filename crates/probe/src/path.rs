//! Dot-notation path resolution.
//!
//! A path is a `.`-delimited sequence of object keys and array indices:
//! `users.0.name` addresses `doc["users"][0]["name"]`. The empty path is
//! the identity and resolves to the root.
//!
//! Known limitation: a literal key that itself contains `.` cannot be
//! addressed, since segments never carry an escaped delimiter.

use serde_json::Value;

/// Split a path string into segments. Empty input yields no segments.
pub fn parse_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Resolve a dot-notation path against a value.
///
/// Returns `None` once any segment fails to match: an out-of-range array
/// index, an absent object key, or leftover segments below a scalar.
/// `None` is an ordinary outcome, distinguishable from a document `null`
/// (`Some(Value::Null)`).
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in parse_path(path) {
        current = match current {
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_path_is_identity() {
        let doc = json!({"a": 1});
        assert_eq!(resolve(&doc, ""), Some(&doc));
    }

    #[test]
    fn resolves_keys_and_indices() {
        let doc = json!({"a": [10, 20], "b": {"c": "x"}});
        assert_eq!(resolve(&doc, "a.0"), Some(&json!(10)));
        assert_eq!(resolve(&doc, "a.1"), Some(&json!(20)));
        assert_eq!(resolve(&doc, "b.c"), Some(&json!("x")));
    }

    #[test]
    fn round_trips_every_top_level_entry() {
        let doc = json!({"x": 1, "y": [true, null], "z": {"k": "v"}});
        for (key, expected) in doc.as_object().unwrap() {
            assert_eq!(resolve(&doc, key), Some(expected));
        }
        let arr = json!([1, "two", {"three": 3}]);
        for (i, expected) in arr.as_array().unwrap().iter().enumerate() {
            assert_eq!(resolve(&arr, &i.to_string()), Some(expected));
        }
    }

    #[test]
    fn not_found_is_distinct_from_null() {
        let doc = json!({"present": null});
        assert_eq!(resolve(&doc, "present"), Some(&Value::Null));
        assert_eq!(resolve(&doc, "absent"), None);
    }

    #[test]
    fn not_found_propagates() {
        let doc = json!({"a": {"b": 1}});
        assert_eq!(resolve(&doc, "a.x.y.z"), None);
        // Scalar with segments remaining.
        assert_eq!(resolve(&doc, "a.b.c"), None);
        // Out-of-range index.
        assert_eq!(resolve(&json!([1]), "5"), None);
        // Non-numeric segment against an array.
        assert_eq!(resolve(&json!([1]), "first"), None);
    }
}
