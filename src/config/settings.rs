//! Configuration settings for Fjern.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agent: AgentSettings,
    pub tool_server: ToolServerSettings,
    pub tv: TvSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.fjern".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Agent settings: which model drives the conversation and how far it may go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Chat model identifier.
    pub model: String,
    /// Maximum number of tool-calling iterations per request.
    pub max_iterations: usize,
    /// Directory for custom instruction prompts (overrides the built-in one).
    pub custom_instructions_dir: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_iterations: 15,
            custom_instructions_dir: None,
        }
    }
}

/// Where the agent finds its tools: a remote MCP server reachable over SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolServerSettings {
    /// SSE endpoint of the TV-control tool server.
    pub url: String,
    /// Seconds to wait for a tool-call response before giving up.
    pub request_timeout_seconds: u64,
}

impl Default for ToolServerSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000/sse".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

/// Sony Bravia TV connection settings.
///
/// `TV_IP` and `TV_PSK` environment variables take precedence; see
/// [`Settings::apply_env_overrides`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TvSettings {
    /// Hostname or IP address of the TV.
    pub host: Option<String>,
    /// Pre-shared key configured on the TV (Network > IP control).
    pub psk: Option<String>,
    /// HTTP port of the TV's IP-control interface.
    pub port: u16,
}

impl Default for TvSettings {
    fn default() -> Self {
        Self {
            host: None,
            psk: None,
            port: 80,
        }
    }
}

impl TvSettings {
    /// Base URL of the TV's IP-control interface.
    pub fn base_url(&self) -> Option<String> {
        self.host.as_ref().map(|host| {
            if self.port == 80 {
                format!("http://{}", host)
            } else {
                format!("http://{}:{}", host, self.port)
            }
        })
    }
}

/// Transport selection for `fjern serve`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerTransport {
    /// SSE stream + POST /messages back-channel.
    #[default]
    Sse,
    /// Plain JSON-RPC request/response on POST /mcp.
    Http,
}

impl std::str::FromStr for ServerTransport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sse" => Ok(ServerTransport::Sse),
            "http" | "streamable" => Ok(ServerTransport::Http),
            _ => Err(format!("Unknown transport: {}", s)),
        }
    }
}

impl std::fmt::Display for ServerTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerTransport::Sse => write!(f, "sse"),
            ServerTransport::Http => write!(f, "http"),
        }
    }
}

/// Settings for the built-in tool server (`fjern serve`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Transport to expose.
    pub transport: ServerTransport,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            transport: ServerTransport::Sse,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply `TV_IP` and `TV_PSK` environment overrides, mirroring the tool
    /// server's expected environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("TV_IP") {
            if !host.is_empty() {
                self.tv.host = Some(host);
            }
        }
        if let Ok(psk) = std::env::var("TV_PSK") {
            if !psk.is_empty() {
                self.tv.psk = Some(psk);
            }
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FjernError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fjern")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.agent.model, "gpt-4o-mini");
        assert_eq!(settings.tool_server.url, "http://127.0.0.1:3000/sse");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.transport, ServerTransport::Sse);
        assert!(settings.tv.host.is_none());
    }

    #[test]
    fn test_tv_base_url() {
        let mut tv = TvSettings::default();
        assert!(tv.base_url().is_none());

        tv.host = Some("192.168.2.250".to_string());
        assert_eq!(tv.base_url().unwrap(), "http://192.168.2.250");

        tv.port = 8080;
        assert_eq!(tv.base_url().unwrap(), "http://192.168.2.250:8080");
    }

    #[test]
    fn test_transport_from_str() {
        assert_eq!("sse".parse::<ServerTransport>().unwrap(), ServerTransport::Sse);
        assert_eq!("streamable".parse::<ServerTransport>().unwrap(), ServerTransport::Http);
        assert!("carrier-pigeon".parse::<ServerTransport>().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[agent]
model = "gpt-4o"

[tv]
host = "10.0.0.9"
psk = "0000"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.agent.model, "gpt-4o");
        assert_eq!(settings.tv.host.as_deref(), Some("10.0.0.9"));
        // Untouched sections keep their defaults.
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.agent.model = "gpt-4.1".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.agent.model, "gpt-4.1");
    }
}
