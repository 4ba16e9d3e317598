//! Agent system binding a chat model to the remote TV-control tools.
//!
//! The agent carries no TV knowledge in code: it discovers the callable
//! operations from the tool server and the instruction prompt teaches the
//! model what they mean.

mod runner;

pub use runner::{parse_arguments, to_chat_tools, Agent, AgentResponse, ToolCallRecord};
