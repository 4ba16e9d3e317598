//! List the tools advertised by the configured tool server.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::mcp::ToolServerClient;
use std::time::Duration;

pub async fn run_tools(settings: Settings) -> Result<()> {
    let spinner = Output::spinner(&format!(
        "Connecting to {}...",
        settings.tool_server.url
    ));

    let client = ToolServerClient::connect(
        &settings.tool_server.url,
        Duration::from_secs(settings.tool_server.request_timeout_seconds),
    )
    .await?;

    let tools = client.list_tools().await?;
    spinner.finish_and_clear();

    if let Some(info) = client.server_info() {
        Output::header(&format!("Tools on {} v{}", info.name, info.version));
    } else {
        Output::header("Available tools");
    }

    if tools.is_empty() {
        Output::warning("The server advertises no tools.");
        return Ok(());
    }

    for tool in &tools {
        Output::tool_info(&tool.name, &tool.description);
    }

    println!();
    Output::info(&format!("{} tool(s) available", tools.len()));

    Ok(())
}
