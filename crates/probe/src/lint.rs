//! Document linting for the validate operation.
//!
//! Lint never aborts on bad input: a parse failure becomes an issue in the
//! report. The duplicate-key check runs over the raw text because parsing
//! collapses duplicate keys before they can be observed.

use serde_json::Value;

use crate::value::depth_of;

/// Which checks to run.
#[derive(Debug, Clone, Copy)]
pub struct LintOptions {
    pub check_duplicates: bool,
    pub check_empty: bool,
    /// Report when container nesting exceeds this depth.
    pub max_depth: Option<usize>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            check_duplicates: true,
            check_empty: true,
            max_depth: None,
        }
    }
}

/// One reported finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub category: &'static str,
    pub message: String,
    pub path: Option<String>,
    pub line: Option<usize>,
}

impl Issue {
    fn new(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            path: None,
            line: None,
        }
    }
}

/// Lint a raw document. Returns an empty list for a clean document.
pub fn lint_text(text: &str, options: &LintOptions) -> Vec<Issue> {
    let mut issues = Vec::new();

    let parsed: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            issues.push(Issue {
                line: Some(err.line()),
                ..Issue::new("parse", format!("Document is not well-formed JSON: {err}"))
            });
            return issues;
        }
    };

    if options.check_duplicates {
        issues.extend(find_duplicate_keys(text));
    }
    if options.check_empty {
        find_empty_containers(&parsed, "", &mut issues);
    }
    if let Some(limit) = options.max_depth {
        let depth = depth_of(&parsed);
        if depth > limit {
            issues.push(Issue::new(
                "depth",
                format!("Nesting depth {depth} exceeds the limit of {limit}"),
            ));
        }
    }

    issues
}

/// String-aware scan for duplicate keys. A stack of per-object key sets
/// tracks scopes: keys are strings immediately followed by `:` inside the
/// innermost `{}`.
fn find_duplicate_keys(text: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut scopes: Vec<Vec<String>> = Vec::new();
    let mut line = 1usize;

    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        match c {
            '\n' => line += 1,
            '{' => scopes.push(Vec::new()),
            '}' => {
                scopes.pop();
            }
            '"' => {
                let mut literal = String::new();
                let mut escaped = false;
                for (_, sc) in chars.by_ref() {
                    if escaped {
                        literal.push(sc);
                        escaped = false;
                    } else if sc == '\\' {
                        escaped = true;
                    } else if sc == '"' {
                        break;
                    } else {
                        if sc == '\n' {
                            line += 1;
                        }
                        literal.push(sc);
                    }
                }
                // A string followed by ':' is a key in the current object.
                let mut lookahead = chars.clone();
                let is_key = loop {
                    match lookahead.peek() {
                        Some((_, w)) if w.is_whitespace() => {
                            lookahead.next();
                        }
                        Some((_, ':')) => break true,
                        _ => break false,
                    }
                };
                if is_key {
                    if let Some(scope) = scopes.last_mut() {
                        if scope.contains(&literal) {
                            issues.push(Issue {
                                line: Some(line),
                                ..Issue::new(
                                    "duplicates",
                                    format!("Duplicate key \"{literal}\""),
                                )
                            });
                        } else {
                            scope.push(literal);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    issues
}

fn find_empty_containers(value: &Value, path: &str, issues: &mut Vec<Issue>) {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                issues.push(Issue {
                    path: Some(display_path(path)),
                    ..Issue::new("empty", "Empty array")
                });
            }
            for (i, item) in items.iter().enumerate() {
                find_empty_containers(item, &format!("{path}[{i}]"), issues);
            }
        }
        Value::Object(map) => {
            if map.is_empty() {
                issues.push(Issue {
                    path: Some(display_path(path)),
                    ..Issue::new("empty", "Empty object")
                });
            }
            for (key, val) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                find_empty_containers(val, &child, issues);
            }
        }
        _ => {}
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_document_has_no_issues() {
        let issues = lint_text(r#"{"a": 1, "b": [2, 3]}"#, &LintOptions::default());
        assert_eq!(issues, vec![]);
    }

    #[test]
    fn parse_failure_is_a_report_not_an_abort() {
        let issues = lint_text("{not json", &LintOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, "parse");
        assert!(issues[0].line.is_some());
    }

    #[test]
    fn duplicate_keys_are_found_per_object() {
        let text = r#"{"a": 1, "a": 2, "nested": {"a": 3}}"#;
        let issues = lint_text(text, &LintOptions::default());
        let dupes: Vec<_> = issues.iter().filter(|i| i.category == "duplicates").collect();
        assert_eq!(dupes.len(), 1);
        assert!(dupes[0].message.contains("\"a\""));
    }

    #[test]
    fn sibling_objects_do_not_share_scope() {
        let text = r#"[{"a": 1}, {"a": 2}]"#;
        let issues = lint_text(text, &LintOptions::default());
        assert!(issues.iter().all(|i| i.category != "duplicates"));
    }

    #[test]
    fn colon_inside_string_value_is_not_a_key() {
        let text = r#"{"a": "x", "note": "a: b"}"#;
        let issues = lint_text(text, &LintOptions::default());
        assert_eq!(issues, vec![]);
    }

    #[test]
    fn empty_containers_are_reported_with_paths() {
        let text = r#"{"a": {}, "b": [[], {"c": []}]}"#;
        let issues = lint_text(text, &LintOptions::default());
        let paths: Vec<&str> = issues
            .iter()
            .filter(|i| i.category == "empty")
            .filter_map(|i| i.path.as_deref())
            .collect();
        assert_eq!(paths, vec!["a", "b[0]", "b[1].c"]);
    }

    #[test]
    fn depth_check_uses_the_given_limit() {
        let text = r#"{"a": {"b": {"c": 1}}}"#;
        let options = LintOptions {
            max_depth: Some(2),
            ..Default::default()
        };
        let issues = lint_text(text, &options);
        assert!(issues.iter().any(|i| i.category == "depth"));
        let relaxed = LintOptions {
            max_depth: Some(5),
            ..Default::default()
        };
        assert_eq!(lint_text(text, &relaxed), vec![]);
    }
}
