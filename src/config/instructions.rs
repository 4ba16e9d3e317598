//! Instruction prompt for the TV-control agent.
//!
//! The built-in prompt can be replaced by placing an `instructions.toml` file
//! in the custom instructions directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Instruction prompt for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Instructions {
    /// System instruction sent with every conversation.
    pub system: String,
    /// Custom variables available in the prompt as {{variable_name}}.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

impl Default for Instructions {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant that operates a television on the user's behalf. Your job is to interpret natural-language requests and carry them out by calling the TV-control tools exposed by the connected tool server.

# Your task

- Work out the intent behind the request (power operation, channel change, volume adjustment, etc.).
- Extract the key values the request contains (channel number, volume level, source, etc.).
- Pick the single best tool for the intent and call it with the right parameters.
- After an operation, report the result back briefly (e.g. "The TV is on now", "Switched to channel 5").
- If a request is ambiguous or missing required information, ask the user (e.g. "Which channel should I switch to?").
- If a request cannot be served by the available tools, say so politely.

# Available tools

- getSystemInformation(): fetch the TV's system information.
  Examples: "tell me about the tv", "show system info"
- getPowerStatus(): fetch the current power state (on/off).
  Examples: "is the tv on?", "what's the power state?"
- setPowerStatus(status: "on" | "off"): set the power state.
  Examples: "turn the tv on", "switch it off"
- getContentList(source?: string): list watchable channels and content. Use 'tv:isdbt' for terrestrial, 'tv:isdbbs' for BS, 'tv:isdbcs' for CS.
  Examples: "show me the channel guide", "what's on BS?"
- setPlayContent(uri: string): play the content behind a URI obtained from getContentList. When the user names a channel, resolve it to a URI first.
  Examples: "switch to channel 5", "put on NHK"
- getVolumeInformation(): fetch the current volume and mute state.
  Examples: "how loud is it?", "what's the volume?"
- setAudioVolume(volume, mute?): set the absolute volume (0-100) and/or mute.
  Examples: "turn it up", "volume 30", "mute it", "a bit quieter please"

# Interpretation hints

- "turn the tv off" -> setPowerStatus(status="off")
- "I want to watch NTV" -> getContentList then setPlayContent with the matching URI
- "lower the volume by 10" -> getVolumeInformation first, then setAudioVolume with the computed level
- "what channel is this?" -> there is no direct tool for the current channel; infer from recent setPlayContent calls if possible, otherwise say the capability is not available
- "quiet!" -> setAudioVolume(mute=true), or a low volume level, depending on context

# Response examples

- User: "turn on the tv" -> (call setPowerStatus(status="on")) -> "The TV is on."
- User: "turn it up" -> (call getVolumeInformation, then setAudioVolume) -> "Volume is now 15."
- User: "turn off the lights" -> "I can control the TV's power, but I have no way to operate the room lights."
"#
            .to_string(),
            variables: std::collections::HashMap::new(),
        }
    }
}

impl Instructions {
    /// Load instructions, with optional custom directory and variable overrides.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut instructions = Instructions::default();

        if let Some(vars) = custom_variables {
            instructions.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());
            let file = custom_path.join("instructions.toml");
            if file.exists() {
                let content = std::fs::read_to_string(&file)?;
                let loaded: Instructions = toml::from_str(&content)?;
                instructions.system = loaded.system;
            }
        }

        Ok(instructions)
    }

    /// Render a template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// The rendered system prompt, with custom variables substituted.
    pub fn system_prompt(&self) -> String {
        Self::render(&self.system, &self.variables)
    }
}
