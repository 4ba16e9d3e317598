//! CLI command implementations.

mod chat;
mod config;
mod doctor;
mod init;
mod mcp;
mod r#do;
mod serve;
mod tools;

pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use init::run_init;
pub use mcp::run_mcp;
pub use r#do::run_do;
pub use serve::run_serve;
pub use tools::run_tools;
