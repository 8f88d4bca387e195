//! # Occam MCP Server
//!
//! Entry point for the MCP (Model Context Protocol) server.
//!
//! Reads configuration from environment variables:
//! - `OCCAM_PROMPTS_FILE`: Optional TOML file with a `[prompts]` table of
//!   guidance overrides
//! - `RUST_LOG`: Log filter (default: `occam_mcp=info,occam_core=info`)
//!
//! Communicates with AI clients (Claude, GPT) via MCP over stdio and runs
//! the engine in-process.

mod server;

use occam_core::{OccamError, PromptCatalog};
use rmcp::{ServiceExt, transport::stdio};
use server::OccamMcp;

const PROMPTS_FILE_ENV: &str = "OCCAM_PROMPTS_FILE";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging to stderr only; stdout is reserved for MCP stdio transport.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "occam_mcp=info,occam_core=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let catalog = load_catalog()?;
    tracing::info!(prompts = catalog.len(), "Occam MCP server starting");

    let service = OccamMcp::new(catalog)
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("MCP serve error: {:?}", e);
        })?;

    service.waiting().await?;
    tracing::info!("Occam MCP server stopped");
    Ok(())
}

/// The standard catalog, patched from `OCCAM_PROMPTS_FILE` when set.
fn load_catalog() -> Result<PromptCatalog, OccamError> {
    let Some(path) = std::env::var_os(PROMPTS_FILE_ENV) else {
        return Ok(PromptCatalog::standard());
    };

    let document = std::fs::read_to_string(&path).map_err(|e| {
        OccamError::Io(format!(
            "Cannot read prompts file '{}': {}",
            path.to_string_lossy(),
            e
        ))
    })?;

    tracing::info!(path = %path.to_string_lossy(), "Loading prompt overrides");
    PromptCatalog::from_toml_str(&document)
}
