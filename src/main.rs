use anyhow::Context;
use catalog_mcp::{CatalogConfig, CatalogServer, CatalogState};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    catalog_mcp::tracing::init();

    let config = CatalogConfig::load().context("Invalid configuration")?;
    tracing::info!(
        "Starting catalog-mcp (catalog: {}, images: {}/{})",
        config
            .catalog_path
            .as_ref()
            .map_or_else(|| "in-memory".to_string(), |path| path.display().to_string()),
        config.image_dir.display(),
        config.bucket
    );

    let state = CatalogState::from_config(config)?;
    let server = CatalogServer::new(Arc::new(state));

    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    Ok(())
}
