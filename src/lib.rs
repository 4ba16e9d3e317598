//! Fjern - Natural-Language TV Remote
//!
//! A CLI tool that puts a conversational agent between you and a Sony
//! Bravia TV. Tell it what you want ("turn on the tv", "switch to NHK",
//! "turn the volume down a bit") and it works out which TV operations
//! to perform.
//!
//! The name "Fjern" comes from the Norwegian word for "remote."
//!
//! # Overview
//!
//! Fjern allows you to:
//! - Control a Bravia TV in plain language, one-shot or interactively
//! - Run the TV tools as an MCP server over SSE, HTTP, or stdio
//! - Point any MCP-capable agent at your TV
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and agent instructions
//! - `agent` - The tool-calling conversation loop
//! - `mcp` - MCP protocol types, the SSE client, and the tool service
//! - `tv` - The Bravia IP-control client
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use fjern::agent::Agent;
//! use fjern::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let agent = Agent::connect(&settings).await?;
//!
//!     let response = agent.run("Is the TV on?").await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod openai;
pub mod tv;

pub use error::{FjernError, Result};
