//! CLI module for Fjern.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Fjern - talk to your TV
///
/// A natural-language remote control for Sony Bravia TVs.
/// The name "Fjern" comes from the Norwegian word for "remote."
#[derive(Parser, Debug)]
#[command(name = "fjern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Fjern and verify the environment
    Init,

    /// Check configuration and connectivity
    Doctor,

    /// Carry out a single request ("turn on the tv", "switch to NHK", ...)
    Do {
        /// The request, in plain language
        request: String,

        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive session with the TV agent
    Chat {
        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the tools the configured tool server exposes
    Tools,

    /// Start the TV-control tool server (HTTP, for remote agents)
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Transport to expose (sse, http)
        #[arg(short, long)]
        transport: Option<String>,
    },

    /// Start the TV-control tool server on stdio (for local assistants)
    Mcp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "agent.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
