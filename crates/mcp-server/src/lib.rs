//! JSON Probe MCP Server
//!
//! Exposes bounded inspection tools for large JSON documents to AI agents
//! via the MCP protocol. Every tool loads the document fresh, queries it
//! through the `json-probe` engine, and returns a budget-bounded text
//! payload; no state survives between calls.

pub mod tools;

pub use tools::JsonProbeService;

use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

/// Binary entry point: stdio MCP transport, logging to stderr.
pub async fn main_entry() -> Result<()> {
    // stdout carries the MCP protocol; keep all logging on stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting JSON Probe MCP server");

    let service = JsonProbeService::new();
    let server = service.serve(stdio()).await?;

    server.waiting().await?;

    log::info!("JSON Probe MCP server stopped");
    Ok(())
}
