//! End-to-end smoke test: spawn the server binary over stdio, list tools,
//! and run a couple of calls against a real file.

use anyhow::{Context, Result};
use rmcp::{model::CallToolRequestParam, service::ServiceExt, transport::TokioChildProcess};
use std::collections::HashSet;
use std::time::Duration;
use tokio::process::Command;

#[tokio::test]
async fn mcp_exposes_all_tools_and_answers_queries() -> Result<()> {
    let bin = env!("CARGO_BIN_EXE_json-probe-mcp");

    let tmp = tempfile::tempdir().context("tempdir")?;
    let doc_path = tmp.path().join("doc.json");
    std::fs::write(
        &doc_path,
        r#"{"users": [{"name": "ada", "age": 36}, {"name": "bob", "age": 25}]}"#,
    )
    .context("write doc")?;

    let mut cmd = Command::new(bin);
    cmd.env("RUST_LOG", "warn");

    let transport = TokioChildProcess::new(cmd).context("spawn mcp server")?;
    let service = tokio::time::timeout(Duration::from_secs(10), ().serve(transport))
        .await
        .context("timeout starting MCP server")??;

    let tools = tokio::time::timeout(
        Duration::from_secs(10),
        service.list_tools(Default::default()),
    )
    .await
    .context("timeout listing tools")??;
    let tool_names: HashSet<&str> = tools.tools.iter().map(|t| t.name.as_ref()).collect();
    for expected in [
        "read", "query", "extract", "slice", "filter", "search", "transform", "validate",
    ] {
        assert!(
            tool_names.contains(expected),
            "missing tool '{expected}' in {tool_names:?}"
        );
    }

    let query_args = serde_json::json!({
        "file_path": doc_path.to_string_lossy(),
        "query_path": "users.0.name",
    });
    let query_result = tokio::time::timeout(
        Duration::from_secs(10),
        service.call_tool(CallToolRequestParam {
            name: "query".into(),
            arguments: query_args.as_object().cloned(),
        }),
    )
    .await
    .context("timeout calling query")??;

    assert_ne!(query_result.is_error, Some(true), "query returned error");
    let query_text = query_result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.as_str())
        .context("query missing text output")?;
    assert!(query_text.contains("ada"), "unexpected output: {query_text}");

    let search_args = serde_json::json!({
        "file_path": doc_path.to_string_lossy(),
        "pattern": "^age$",
        "search_type": "key",
    });
    let search_result = tokio::time::timeout(
        Duration::from_secs(10),
        service.call_tool(CallToolRequestParam {
            name: "search".into(),
            arguments: search_args.as_object().cloned(),
        }),
    )
    .await
    .context("timeout calling search")??;

    assert_ne!(search_result.is_error, Some(true), "search returned error");
    let search_text = search_result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.as_str())
        .context("search missing text output")?;
    assert!(
        search_text.contains("Found 2 matches"),
        "unexpected output: {search_text}"
    );

    service.cancel().await.context("shutdown mcp service")?;
    Ok(())
}
