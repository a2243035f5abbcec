use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    json_probe_mcp::main_entry().await
}
