//! Error types for Fjern.

use thiserror::Error;

/// Library-level error type for Fjern operations.
#[derive(Error, Debug)]
pub enum FjernError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool server error: {0}")]
    ToolServer(String),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("TV RPC error: {message} (Code: {code})")]
    TvRpc { code: i64, message: String },

    #[error("The display is turned off. Turn the TV on first. (Code: 40005)")]
    DisplayOff,

    #[error("HTTP error from TV: {0}")]
    TvHttp(String),

    #[error("Network error: could not reach TV at {0}")]
    TvUnreachable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Timed out waiting for the tool server")]
    Timeout,
}

/// Result type alias for Fjern operations.
pub type Result<T> = std::result::Result<T, FjernError>;
