//! Stdio MCP transport for local assistants.

use crate::cli::preflight::{self, Operation};
use crate::config::Settings;
use crate::error::FjernError;
use crate::mcp::McpService;
use crate::tv::BraviaClient;
use anyhow::Result;
use std::sync::Arc;

/// Run the TV tool server on stdin/stdout.
pub async fn run_mcp(settings: Settings) -> Result<()> {
    preflight::check(Operation::Serve, &settings)?;

    let base_url = settings
        .tv
        .base_url()
        .ok_or_else(|| FjernError::Config("TV host not configured".to_string()))?;
    let psk = settings.tv.psk.clone().unwrap_or_default();

    let tv = BraviaClient::new(&base_url, &psk)?;
    let service = McpService::new(Arc::new(tv));
    service.run_stdio().await
}
