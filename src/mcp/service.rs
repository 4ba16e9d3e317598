//! MCP request dispatch, shared by the stdio, SSE and HTTP transports.

use super::protocol::*;
use super::tools::{self, get_tools};
use crate::tv::TvControl;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, warn};

const SERVER_NAME: &str = "fjern";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP service fronting a TV.
pub struct McpService {
    tv: Arc<dyn TvControl>,
}

impl McpService {
    /// Create a service for the given TV.
    pub fn new(tv: Arc<dyn TvControl>) -> Self {
        Self { tv }
    }

    /// Handle a single JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "Handling MCP request");
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "initialized" | "notifications/initialized" => {
                // Notification; acknowledge with an empty result.
                JsonRpcResponse::success(request.id, json!({}))
            }
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                &format!("Method not found: {}", request.method),
            ),
        }
    }

    /// Parse and handle a raw JSON-RPC line.
    pub async fn handle_raw(&self, raw: &str) -> JsonRpcResponse {
        match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                JsonRpcResponse::error(None, -32700, "Parse error")
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ToolsListResult { tools: get_tools() };
        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, &format!("Invalid params: {}", e))
                }
            },
            None => return JsonRpcResponse::error(id, -32602, "Missing params"),
        };

        let result = tools::execute(&self.tv, &params.name, params.arguments).await;
        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    /// Run the stdio transport (reads from stdin, writes to stdout).
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        // Log to stderr so it doesn't interfere with JSON-RPC
        eprintln!("Fjern MCP server starting...");

        for line in stdin.lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let response = self.handle_raw(&line).await;
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tv::{ContentItem, PowerStatus, SystemInformation, VolumeInformation};
    use async_trait::async_trait;

    struct IdleTv;

    #[async_trait]
    impl TvControl for IdleTv {
        async fn system_information(&self) -> Result<SystemInformation> {
            Ok(SystemInformation::default())
        }
        async fn power_status(&self) -> Result<PowerStatus> {
            Ok(PowerStatus::Standby)
        }
        async fn set_power_status(&self, _on: bool) -> Result<()> {
            Ok(())
        }
        async fn content_list(&self, _source: &str) -> Result<Vec<ContentItem>> {
            Ok(vec![])
        }
        async fn set_play_content(&self, _uri: &str) -> Result<()> {
            Ok(())
        }
        async fn volume_information(&self) -> Result<VolumeInformation> {
            Ok(VolumeInformation::default())
        }
        async fn set_audio_volume(&self, _target: &str, _volume: u32) -> Result<()> {
            Ok(())
        }
        async fn set_audio_mute(&self, _mute: bool) -> Result<()> {
            Ok(())
        }
    }

    fn service() -> McpService {
        McpService::new(Arc::new(IdleTv))
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = service()
            .handle_raw(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "fjern");
    }

    #[tokio::test]
    async fn test_tools_list_exposes_tv_tools() {
        let response = service()
            .handle_raw(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await;
        let tools = response.result.unwrap()["tools"].clone();
        assert_eq!(tools.as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_tools_call_power_status() {
        let response = service()
            .handle_raw(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"getPowerStatus"}}"#,
            )
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("OFF"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = service()
            .handle_raw(r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#)
            .await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = service().handle_raw("this is not json").await;
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let response = service()
            .handle_raw(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call"}"#)
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
