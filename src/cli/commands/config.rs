//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let mut settings = settings;
            set_value(&mut settings, key, value)?;

            let config_path = Settings::default_config_path();
            settings.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::info(&format!("Saved to {}", config_path.display()));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Apply a dotted-key assignment to the settings.
fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "general.data_dir" => settings.general.data_dir = value.to_string(),
        "general.log_level" => settings.general.log_level = value.to_string(),
        "agent.model" => settings.agent.model = value.to_string(),
        "agent.max_iterations" => {
            settings.agent.max_iterations = value
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a positive integer", key))?;
        }
        "agent.custom_instructions_dir" => {
            settings.agent.custom_instructions_dir = Some(value.to_string());
        }
        "tool_server.url" => settings.tool_server.url = value.to_string(),
        "tool_server.request_timeout_seconds" => {
            settings.tool_server.request_timeout_seconds = value
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a number of seconds", key))?;
        }
        "tv.host" => settings.tv.host = Some(value.to_string()),
        "tv.psk" => settings.tv.psk = Some(value.to_string()),
        "tv.port" => {
            settings.tv.port = value
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a port number", key))?;
        }
        "server.host" => settings.server.host = value.to_string(),
        "server.port" => {
            settings.server.port = value
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a port number", key))?;
        }
        "server.transport" => {
            settings.server.transport = value
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown configuration key: {} (try 'fjern config show' for the available sections)",
                key
            ))
        }
    }
    Ok(())
}
