use std::sync::Arc;

use aidj::config::Config;
use aidj::mcp::DjServer;
use aidj::tools::ToolRegistry;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout belongs to the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!("Using music service at {}", config.base_url);

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("aidj/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let registry = ToolRegistry::with_builtin(config, http_client);
    let server = DjServer::new(Arc::new(registry));

    info!("Serving MCP tools over stdio...");
    let service = server
        .serve(stdio())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {}", e))?;
    let reason = service.waiting().await?;
    info!("MCP session ended: {:?}", reason);

    Ok(())
}
