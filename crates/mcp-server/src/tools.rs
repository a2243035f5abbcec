//! MCP Tools for JSON Probe
//!
//! Bounded views into large JSON documents for AI agents: structural
//! overviews, path queries, regex search, filtering, slicing, and array
//! transforms. Every tool follows the same composition: load the document,
//! resolve the optional path, apply at most one selector or transform, and
//! bound the final payload once before serializing it.

use json_probe::{
    bound, filter, lint_text, map_values, project_keys, reduce_values, render, resolve, sample,
    search, slice_array, sort_values, stats, type_name, Expr, LintOptions, ProbeError,
    SampleOptions, SearchHit, SearchTarget, DEFAULT_MAX_OUTPUT_LEN, DEFAULT_MAX_RESULTS,
};
use regex::{Regex, RegexBuilder};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use serde_json::{json, Value};

/// JSON Probe MCP Service
#[derive(Clone)]
pub struct JsonProbeService {
    /// Tool router
    tool_router: ToolRouter<Self>,
}

impl JsonProbeService {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for JsonProbeService {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for JsonProbeService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("JSON Probe provides bounded views into large JSON files. Use 'read' with keys_only for a structural overview, 'query' to fetch a value by dot-notation path, 'search' for regex matches over keys/values, and 'filter'/'transform' for expression-based selection. Output is truncated to a fixed budget with explicit elision markers.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

impl JsonProbeService {
    /// Load and parse the document for one request. Nothing is cached;
    /// every call re-reads from disk.
    async fn load_document(file_path: &str) -> Result<Value, ProbeError> {
        let text = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|e| ProbeError::load(file_path, e))?;
        serde_json::from_str(&text).map_err(|e| ProbeError::parse(file_path, e))
    }

    /// Bound the final payload and serialize it for display. Applied
    /// exactly once per response, never to intermediate values.
    fn finish(value: &Value) -> String {
        render(&bound(value, DEFAULT_MAX_OUTPUT_LEN))
    }

    fn error_text(err: impl std::fmt::Display) -> CallToolResult {
        CallToolResult::error(vec![Content::text(format!("Error: {err}"))])
    }

    /// A missing path is a normal outcome, not an error.
    fn not_found(path: &str, default_value: Option<&Value>) -> CallToolResult {
        let mut text = format!("Path '{path}' not found in document.");
        if let Some(default) = default_value {
            text.push_str("\nReturning default value:\n");
            text.push_str(&Self::finish(default));
        }
        CallToolResult::success(vec![Content::text(text)])
    }

    fn compile_pattern(pattern: &str, case_sensitive: bool) -> Result<Regex, ProbeError> {
        RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| ProbeError::expression(format!("invalid pattern: {e}")))
    }

    /// Shared slice/projection behavior: arrays take start/end ranges,
    /// objects take a key list. The two are mutually exclusive by target
    /// type.
    fn slice_target(
        target: &Value,
        start: Option<usize>,
        end: Option<usize>,
        keys: Option<&Vec<String>>,
    ) -> Result<Value, ProbeError> {
        match target {
            Value::Array(items) => Ok(Value::Array(slice_array(items, start, end))),
            Value::Object(map) => match keys {
                Some(keys) => Ok(Value::Object(project_keys(map, keys))),
                None => Err(ProbeError::type_mismatch(
                    "array (objects require 'keys')",
                    "object",
                )),
            },
            other => Err(ProbeError::type_mismatch(
                "array or object",
                type_name(other),
            )),
        }
    }

    fn hits_to_value(hits: &[SearchHit]) -> Value {
        Value::Array(
            hits.iter()
                .map(|hit| {
                    json!({
                        "type": hit.kind.as_str(),
                        "path": hit.path,
                        "key": hit.key,
                        "value": hit.value,
                    })
                })
                .collect(),
        )
    }

    fn search_report(hits: &[SearchHit], max_results: usize) -> String {
        let summary = if hits.len() >= max_results {
            // Traversal stopped at the cap; the true total is unknown.
            format!("Found {} matches (limit reached, more may exist):", hits.len())
        } else {
            format!("Found {} matches:", hits.len())
        };
        format!("{summary}\n{}", Self::finish(&Self::hits_to_value(hits)))
    }
}

// ============================================================================
// Tool Input Schemas
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Dot-notation path to read from (default: document root)
    #[schemars(description = "Dot-notation path, e.g. 'users.0.name' (default: root)")]
    pub path: Option<String>,

    /// Maximum structure depth for overview output (default: 3)
    #[schemars(description = "Maximum depth to expand in keys_only mode (default: 3)")]
    pub max_depth: Option<usize>,

    /// Maximum keys shown per object in overview output (default: all)
    #[schemars(description = "Maximum keys per object in keys_only mode (default: all)")]
    pub max_keys: Option<usize>,

    /// Sample arrays to their first elements in overview output (default: true)
    #[schemars(description = "Sample arrays to their first 3 elements plus a count marker (default: true)")]
    pub sample_arrays: Option<bool>,

    /// Return a structural overview instead of values (default: false)
    #[schemars(description = "Return structure only: type names instead of values (default: false)")]
    pub keys_only: Option<bool>,

    /// Show type names for scalar leaves in overview output (default: true)
    #[schemars(description = "Show scalar type names in keys_only mode (default: true)")]
    pub include_types: Option<bool>,

    /// Append a size/shape summary (default: false)
    #[schemars(description = "Append node counts, depth, and size stats (default: false)")]
    pub include_stats: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QueryRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Dot-notation path to look up
    #[schemars(description = "Dot-notation path, e.g. 'users.0.name'")]
    pub query_path: String,

    /// Value to return when the path does not resolve
    #[schemars(description = "Value returned when the path is not found")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExtractRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Dot-notation path to the target (default: document root)
    #[schemars(description = "Dot-notation path to the extraction target (default: root)")]
    pub path: Option<String>,

    /// Predicate expression, e.g. "item.age > 30"
    #[schemars(description = "Predicate expression over item/key/index/value")]
    pub filter: Option<String>,

    /// Regex pattern to search for instead of filtering
    #[schemars(description = "Regex pattern searched over the resolved target")]
    pub pattern: Option<String>,

    /// What the pattern matches: key, value, or both (default: both)
    #[schemars(description = "Search target: 'key', 'value', or 'both' (default: both)")]
    pub search_type: Option<String>,

    /// Slice start index (arrays)
    #[schemars(description = "Array slice start index (inclusive)")]
    pub start: Option<usize>,

    /// Slice end index (arrays)
    #[schemars(description = "Array slice end index (exclusive)")]
    pub end: Option<usize>,

    /// Keys to project (objects)
    #[schemars(description = "Object keys to keep")]
    pub keys: Option<Vec<String>>,

    /// Value to return when the path does not resolve
    #[schemars(description = "Value returned when the path is not found")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SliceRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Dot-notation path to the target (default: document root)
    #[schemars(description = "Dot-notation path to the target (default: root)")]
    pub path: Option<String>,

    /// Slice start index (arrays)
    #[schemars(description = "Array slice start index (inclusive, default 0)")]
    pub start: Option<usize>,

    /// Slice end index (arrays)
    #[schemars(description = "Array slice end index (exclusive, default length)")]
    pub end: Option<usize>,

    /// Keys to project (objects)
    #[schemars(description = "Object keys to keep (required for object targets)")]
    pub keys: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FilterRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Predicate expression, e.g. "item.age > 30 && item.active"
    #[schemars(description = "Predicate expression over item/key/index/value")]
    pub expression: String,

    /// Dot-notation path to the target (default: document root)
    #[schemars(description = "Dot-notation path to the target (default: root)")]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Regex pattern to search for
    #[schemars(description = "Regex pattern, e.g. '^id' or 'error.*timeout'")]
    pub pattern: String,

    /// What to match: key, value, or both (default: both)
    #[schemars(description = "Search target: 'key', 'value', or 'both' (default: both)")]
    pub search_type: Option<String>,

    /// Case-sensitive matching (default: false)
    #[schemars(description = "Match case-sensitively (default: false)")]
    pub case_sensitive: Option<bool>,

    /// Maximum matches to return (default: 100)
    #[schemars(description = "Maximum number of matches (default: 100)")]
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TransformRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Transform kind: map, reduce, or sort
    #[schemars(description = "One of 'map', 'reduce', 'sort'")]
    pub operation: String,

    /// Transform expression
    #[schemars(description = "map: over item/index; reduce: over acc/item/index; sort: three-way comparator over a/b")]
    pub expression: String,

    /// Dot-notation path to the target (default: document root)
    #[schemars(description = "Dot-notation path to the target (default: root)")]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateRequest {
    /// Path to the JSON file
    #[schemars(description = "Path to the JSON file")]
    pub file_path: String,

    /// Scan for duplicate object keys (default: true)
    #[schemars(description = "Scan the raw text for duplicate object keys (default: true)")]
    pub check_duplicates: Option<bool>,

    /// Report empty objects and arrays (default: true)
    #[schemars(description = "Report empty objects and arrays with their paths (default: true)")]
    pub check_empty: Option<bool>,

    /// Report nesting deeper than this limit
    #[schemars(description = "Report container nesting deeper than this limit")]
    pub max_depth_check: Option<usize>,
}

// ============================================================================
// Tools
// ============================================================================

#[tool_router]
impl JsonProbeService {
    /// Read a document or a structural overview of it
    #[tool(description = "Read a JSON file with output bounding. Use keys_only=true for a structural overview of large files, include_stats=true for size/shape info.")]
    pub async fn read(
        &self,
        Parameters(request): Parameters<ReadRequest>,
    ) -> Result<CallToolResult, McpError> {
        let doc = match Self::load_document(&request.file_path).await {
            Ok(d) => d,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let path = request.path.unwrap_or_default();
        let Some(target) = resolve(&doc, &path) else {
            return Ok(Self::not_found(&path, None));
        };

        let payload = if request.keys_only.unwrap_or(false) {
            let options = SampleOptions {
                max_depth: request.max_depth.unwrap_or(3),
                max_keys: request.max_keys,
                sample_arrays: request.sample_arrays.unwrap_or(true),
                include_types: request.include_types.unwrap_or(true),
            };
            sample(target, &options)
        } else {
            target.clone()
        };

        let mut text = Self::finish(&payload);
        if request.include_stats.unwrap_or(false) {
            let s = stats(target);
            text.push_str(&format!(
                "\n\n## Stats\n\n- nodes: {} ({} objects, {} arrays, {} strings, {} numbers, {} booleans, {} nulls)\n- max depth: {}\n- largest array: {} items\n- largest object: {} keys\n",
                s.total_nodes,
                s.objects,
                s.arrays,
                s.strings,
                s.numbers,
                s.booleans,
                s.nulls,
                s.max_depth,
                s.largest_array,
                s.largest_object,
            ));
        }
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Fetch a single value by path
    #[tool(description = "Look up a value by dot-notation path (e.g. 'users.0.name'). A missing path returns a not-found result with the optional default_value, never an error.")]
    pub async fn query(
        &self,
        Parameters(request): Parameters<QueryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let doc = match Self::load_document(&request.file_path).await {
            Ok(d) => d,
            Err(e) => return Ok(Self::error_text(e)),
        };
        match resolve(&doc, &request.query_path) {
            Some(value) => {
                let text = format!(
                    "Found value at '{}':\n{}",
                    request.query_path,
                    Self::finish(value)
                );
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            None => Ok(Self::not_found(
                &request.query_path,
                request.default_value.as_ref(),
            )),
        }
    }

    /// Extract data with one of filter / search / slice+keys
    #[tool(description = "Extract from a JSON file: resolve an optional path, then apply at most one of a filter expression, a regex search, or slice/keys selection.")]
    pub async fn extract(
        &self,
        Parameters(request): Parameters<ExtractRequest>,
    ) -> Result<CallToolResult, McpError> {
        let doc = match Self::load_document(&request.file_path).await {
            Ok(d) => d,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let path = request.path.unwrap_or_default();
        let Some(target) = resolve(&doc, &path) else {
            return Ok(Self::not_found(&path, request.default_value.as_ref()));
        };

        if let Some(source) = &request.filter {
            let predicate = match Expr::parse(source) {
                Ok(p) => p,
                Err(e) => return Ok(Self::error_text(e)),
            };
            return Ok(match filter(target, &predicate) {
                Ok(kept) => CallToolResult::success(vec![Content::text(Self::finish(&kept))]),
                Err(e) => Self::error_text(e),
            });
        }

        if let Some(pattern) = &request.pattern {
            let target_kind = request.search_type.as_deref().unwrap_or("both");
            let Some(search_target) = SearchTarget::parse(target_kind) else {
                return Ok(Self::error_text(format!(
                    "invalid search_type '{target_kind}' (expected key, value, or both)"
                )));
            };
            let regex = match Self::compile_pattern(pattern, false) {
                Ok(r) => r,
                Err(e) => return Ok(Self::error_text(e)),
            };
            // Search runs on the resolved, unfiltered target; bounding
            // applies only to the formatted hit list afterwards.
            let hits = search(target, &regex, search_target, DEFAULT_MAX_RESULTS);
            return Ok(CallToolResult::success(vec![Content::text(
                Self::search_report(&hits, DEFAULT_MAX_RESULTS),
            )]));
        }

        if request.start.is_some() || request.end.is_some() || request.keys.is_some() {
            return Ok(
                match Self::slice_target(target, request.start, request.end, request.keys.as_ref())
                {
                    Ok(selected) => {
                        CallToolResult::success(vec![Content::text(Self::finish(&selected))])
                    }
                    Err(e) => Self::error_text(e),
                },
            );
        }

        Ok(CallToolResult::success(vec![Content::text(Self::finish(
            target,
        ))]))
    }

    /// Slice an array or project object keys
    #[tool(description = "Slice an array target with half-open [start, end) bounds, or project an object target down to the listed keys.")]
    pub async fn slice(
        &self,
        Parameters(request): Parameters<SliceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let doc = match Self::load_document(&request.file_path).await {
            Ok(d) => d,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let path = request.path.unwrap_or_default();
        let Some(target) = resolve(&doc, &path) else {
            return Ok(Self::not_found(&path, None));
        };
        match Self::slice_target(target, request.start, request.end, request.keys.as_ref()) {
            Ok(selected) => Ok(CallToolResult::success(vec![Content::text(Self::finish(
                &selected,
            ))])),
            Err(e) => Ok(Self::error_text(e)),
        }
    }

    /// Filter a container by a predicate expression
    #[tool(description = "Filter an array or object by a predicate expression, e.g. \"item.age > 30\". Arrays bind item/index, objects bind item/key/index/value.")]
    pub async fn filter(
        &self,
        Parameters(request): Parameters<FilterRequest>,
    ) -> Result<CallToolResult, McpError> {
        let doc = match Self::load_document(&request.file_path).await {
            Ok(d) => d,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let path = request.path.unwrap_or_default();
        let Some(target) = resolve(&doc, &path) else {
            return Ok(Self::not_found(&path, None));
        };
        let predicate = match Expr::parse(&request.expression) {
            Ok(p) => p,
            Err(e) => return Ok(Self::error_text(e)),
        };
        match filter(target, &predicate) {
            Ok(kept) => Ok(CallToolResult::success(vec![Content::text(Self::finish(
                &kept,
            ))])),
            Err(e) => Ok(Self::error_text(e)),
        }
    }

    /// Regex search over keys and values
    #[tool(description = "Search a JSON file for a regex pattern over keys, values, or both. Case-insensitive by default; results are path-tagged and capped by max_results.")]
    pub async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let doc = match Self::load_document(&request.file_path).await {
            Ok(d) => d,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let target_kind = request.search_type.as_deref().unwrap_or("both");
        let Some(search_target) = SearchTarget::parse(target_kind) else {
            return Ok(Self::error_text(format!(
                "invalid search_type '{target_kind}' (expected key, value, or both)"
            )));
        };
        let regex = match Self::compile_pattern(
            &request.pattern,
            request.case_sensitive.unwrap_or(false),
        ) {
            Ok(r) => r,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let max_results = request.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let hits = search(&doc, &regex, search_target, max_results);
        Ok(CallToolResult::success(vec![Content::text(
            Self::search_report(&hits, max_results),
        )]))
    }

    /// Map, reduce, or sort an array target
    #[tool(description = "Transform a target: 'map' applies an expression over item/index, 'reduce' folds over acc/item/index from an empty-object accumulator, 'sort' orders by a three-way comparator over a/b. Returns a new value; the file is never modified.")]
    pub async fn transform(
        &self,
        Parameters(request): Parameters<TransformRequest>,
    ) -> Result<CallToolResult, McpError> {
        let doc = match Self::load_document(&request.file_path).await {
            Ok(d) => d,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let path = request.path.unwrap_or_default();
        let Some(target) = resolve(&doc, &path) else {
            return Ok(Self::not_found(&path, None));
        };
        let expression = match Expr::parse(&request.expression) {
            Ok(p) => p,
            Err(e) => return Ok(Self::error_text(e)),
        };
        let result = match request.operation.as_str() {
            "map" => map_values(target, &expression),
            "reduce" => reduce_values(target, &expression),
            "sort" => sort_values(target, &expression),
            other => {
                return Ok(Self::error_text(format!(
                    "unknown transform operation '{other}' (expected map, reduce, or sort)"
                )))
            }
        };
        match result {
            Ok(transformed) => Ok(CallToolResult::success(vec![Content::text(Self::finish(
                &transformed,
            ))])),
            Err(e) => Ok(Self::error_text(e)),
        }
    }

    /// Lint a document and report issues as markdown
    #[tool(description = "Validate a JSON file: well-formedness, duplicate keys, empty containers, and nesting depth. Malformed JSON is reported as a finding, not an error.")]
    pub async fn validate(
        &self,
        Parameters(request): Parameters<ValidateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = match tokio::fs::read_to_string(&request.file_path).await {
            Ok(t) => t,
            Err(e) => {
                return Ok(Self::error_text(format!(
                    "Failed to load '{}': {e}",
                    request.file_path
                )))
            }
        };
        let options = LintOptions {
            check_duplicates: request.check_duplicates.unwrap_or(true),
            check_empty: request.check_empty.unwrap_or(true),
            max_depth: request.max_depth_check,
        };
        let issues = lint_text(&text, &options);

        let mut report = format!("# Validation Report: {}\n\n", request.file_path);
        if issues.is_empty() {
            report.push_str("No issues found.\n");
        } else {
            report.push_str(&format!("Found {} issue(s):\n\n", issues.len()));
            for issue in &issues {
                let mut line = format!("- [{}] {}", issue.category, issue.message);
                if let Some(path) = &issue.path {
                    line.push_str(&format!(" at `{path}`"));
                }
                if let Some(line_no) = issue.line {
                    line.push_str(&format!(" (line {line_no})"));
                }
                line.push('\n');
                report.push_str(&line);
            }
        }
        Ok(CallToolResult::success(vec![Content::text(report)]))
    }
}
