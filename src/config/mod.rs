//! Configuration module for Fjern.
//!
//! Handles loading and managing application settings and the agent's
//! instruction prompt.

mod instructions;
mod settings;

pub use instructions::Instructions;
pub use settings::{
    AgentSettings, GeneralSettings, ServerSettings, ServerTransport, Settings,
    ToolServerSettings, TvSettings,
};
