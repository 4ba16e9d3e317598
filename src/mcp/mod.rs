//! MCP (Model Context Protocol) support for Fjern.
//!
//! Both directions live here: the agent consumes a remote tool server over
//! SSE (`client`), and `fjern serve` / `fjern mcp` expose the TV tools to
//! other assistants (`service`, `tools`). JSON-RPC 2.0 throughout.

pub mod client;
mod protocol;
mod service;
mod sse;
mod tools;

pub use client::ToolServerClient;
pub use protocol::{
    JsonRpcRequest, JsonRpcResponse, Tool, ToolCallParams, ToolCallResult, ToolContent,
    PROTOCOL_VERSION,
};
pub use service::McpService;
pub use sse::{SseEvent, SseParser};
pub use tools::get_tools;
