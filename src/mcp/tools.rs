//! TV-control tool definitions and execution.
//!
//! Tool names and semantics follow the Bravia IP-control vocabulary so the
//! instruction prompt and the server contract line up.

use super::protocol::{Tool, ToolCallResult};
use crate::error::FjernError;
use crate::tv::TvControl;
use serde_json::{json, Value};
use std::sync::Arc;

/// Default content source when none is given (terrestrial broadcast).
const DEFAULT_CONTENT_SOURCE: &str = "tv:isdbt";

/// Get all available tools.
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "getSystemInformation".to_string(),
            description: "Get the TV's system information (product, model, name)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        Tool {
            name: "getPowerStatus".to_string(),
            description: "Get the TV's current power state (on/off).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        Tool {
            name: "setPowerStatus".to_string(),
            description: "Set the TV's power state.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["on", "off"],
                        "description": "The power state to set ('on' or 'off')"
                    }
                },
                "required": ["status"]
            }),
        },
        Tool {
            name: "getContentList".to_string(),
            description: "List available channels and inputs. Use 'tv:isdbt' for terrestrial, \
                'tv:isdbbs' for BS, 'tv:isdbcs' for CS."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {
                        "type": "string",
                        "description": "Content source to list. 'tv:isdbt' for terrestrial (default), 'tv:isdbbs' for BS, 'tv:isdbcs' for CS."
                    }
                },
                "required": []
            }),
        },
        Tool {
            name: "setPlayContent".to_string(),
            description: "Play (display) the content behind a URI.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "uri": {
                        "type": "string",
                        "description": "URI of the content to play (e.g. 'extInput:hdmi?port=1', 'tv:dvbt?channel=1'). Use URIs from 'getContentList'."
                    }
                },
                "required": ["uri"]
            }),
        },
        Tool {
            name: "getVolumeInformation".to_string(),
            description: "Get the TV's current volume and mute state.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        Tool {
            name: "setAudioVolume".to_string(),
            description: "Set the TV's volume level and/or mute state.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "target": {
                        "type": "string",
                        "enum": ["speaker", "headphone"],
                        "description": "Output to adjust ('speaker' or 'headphone')",
                        "default": "speaker"
                    },
                    "volume": {
                        "type": "string",
                        "description": "Absolute volume level (0-100)"
                    },
                    "mute": {
                        "type": "boolean",
                        "description": "Mute state (true to mute, false to unmute)"
                    }
                },
                "required": []
            }),
        },
    ]
}

/// Execute a named tool against the TV.
pub async fn execute(tv: &Arc<dyn TvControl>, name: &str, args: Option<Value>) -> ToolCallResult {
    match name {
        "getSystemInformation" => tool_system_information(tv).await,
        "getPowerStatus" => tool_power_status(tv).await,
        "setPowerStatus" => tool_set_power_status(tv, args).await,
        "getContentList" => tool_content_list(tv, args).await,
        "setPlayContent" => tool_set_play_content(tv, args).await,
        "getVolumeInformation" => tool_volume_information(tv).await,
        "setAudioVolume" => tool_set_audio_volume(tv, args).await,
        _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
    }
}

async fn tool_system_information(tv: &Arc<dyn TvControl>) -> ToolCallResult {
    match tv.system_information().await {
        Ok(info) => {
            let raw = serde_json::to_value(&info).unwrap_or_default();
            ToolCallResult::text_with_json("Fetched the TV's system information.".to_string(), &raw)
        }
        Err(e) => ToolCallResult::error(format!("Failed to get system information: {}", e)),
    }
}

async fn tool_power_status(tv: &Arc<dyn TvControl>) -> ToolCallResult {
    match tv.power_status().await {
        Ok(status) => ToolCallResult::text_with_json(
            format!("The TV's power state is {}.", status.as_display()),
            &json!({ "status": status.as_api() }),
        ),
        Err(e) => ToolCallResult::error(format!("Failed to get power status: {}", e)),
    }
}

async fn tool_set_power_status(tv: &Arc<dyn TvControl>, args: Option<Value>) -> ToolCallResult {
    let Some(args) = args else {
        return ToolCallResult::error("Missing arguments".to_string());
    };

    let on = match args.get("status").and_then(Value::as_str) {
        Some("on") => true,
        Some("off") => false,
        Some(other) => {
            return ToolCallResult::error(format!(
                "Invalid 'status': {} (expected 'on' or 'off')",
                other
            ))
        }
        None => return ToolCallResult::error("Missing 'status' argument".to_string()),
    };

    match tv.set_power_status(on).await {
        Ok(()) => ToolCallResult::text(format!(
            "Turned the TV {}.",
            if on { "on" } else { "off" }
        )),
        Err(e) => ToolCallResult::error(format!("Failed to set power status: {}", e)),
    }
}

async fn tool_content_list(tv: &Arc<dyn TvControl>, args: Option<Value>) -> ToolCallResult {
    let source = args
        .as_ref()
        .and_then(|a| a.get("source"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CONTENT_SOURCE)
        .to_string();

    match tv.content_list(&source).await {
        Ok(items) if items.is_empty() => ToolCallResult::text(format!(
            "No content found for source '{}'. Check the source name.",
            source
        )),
        Ok(items) => {
            let mut text = String::from("Available content:\n");
            for item in &items {
                text.push_str(&format!("- {} (URI: {})\n", item.label(), item.uri));
            }
            text.push_str("\nUse these URIs with the 'setPlayContent' tool to select content.");

            let raw = serde_json::to_value(&items).unwrap_or_default();
            ToolCallResult::text_with_json(text, &raw)
        }
        Err(e) => ToolCallResult::error(format!("Failed to get content list: {}", e)),
    }
}

async fn tool_set_play_content(tv: &Arc<dyn TvControl>, args: Option<Value>) -> ToolCallResult {
    let Some(uri) = args
        .as_ref()
        .and_then(|a| a.get("uri"))
        .and_then(Value::as_str)
    else {
        return ToolCallResult::error("Missing 'uri' argument".to_string());
    };

    match tv.set_play_content(uri).await {
        Ok(()) => ToolCallResult::text(format!("Switched to content (URI: {}).", uri)),
        Err(e) => ToolCallResult::error(format!("Failed to switch content: {}", e)),
    }
}

async fn tool_volume_information(tv: &Arc<dyn TvControl>) -> ToolCallResult {
    match tv.volume_information().await {
        Ok(info) => {
            let text = format!(
                "Current volume: {}, mute: {} (range: {}-{}).",
                info.volume,
                if info.mute { "ON" } else { "OFF" },
                info.min_volume,
                info.max_volume
            );
            let raw = serde_json::to_value(&info).unwrap_or_default();
            ToolCallResult::text_with_json(text, &raw)
        }
        Err(FjernError::DisplayOff) => ToolCallResult::error(
            "The TV is turned off, so volume information is unavailable. Turn the TV on first."
                .to_string(),
        ),
        Err(e) => ToolCallResult::error(format!("Failed to get volume information: {}", e)),
    }
}

async fn tool_set_audio_volume(tv: &Arc<dyn TvControl>, args: Option<Value>) -> ToolCallResult {
    let args = args.unwrap_or_else(|| json!({}));

    let target = args
        .get("target")
        .and_then(Value::as_str)
        .unwrap_or("speaker")
        .to_string();
    // Models sometimes send volume as a number instead of a string.
    let volume = match args.get("volume") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Null) | None => None,
        Some(other) => {
            return ToolCallResult::error(format!("Invalid 'volume' argument: {}", other))
        }
    };
    let mute = args.get("mute").and_then(Value::as_bool);

    if volume.is_none() && mute.is_none() {
        return ToolCallResult::error(
            "Specify a volume level ('volume') and/or a mute state ('mute').".to_string(),
        );
    }

    let mut message = String::new();

    if let Some(volume) = volume {
        let level: u32 = match volume.trim().parse() {
            Ok(v) if v <= 100 => v,
            _ => {
                return ToolCallResult::error(
                    "Volume must be a number between 0 and 100.".to_string(),
                )
            }
        };

        if let Err(e) = tv.set_audio_volume(&target, level).await {
            return ToolCallResult::error(format!("Failed to set volume: {}", e));
        }
        message = format!("Set the {} volume to {}.", target, level);
    }

    if let Some(mute) = mute {
        if let Err(e) = tv.set_audio_mute(mute).await {
            return ToolCallResult::error(format!("Failed to set mute: {}", e));
        }
        if message.is_empty() {
            message = format!("Turned mute {}.", if mute { "ON" } else { "OFF" });
        } else {
            message.push_str(&format!(" Mute is now {}.", if mute { "ON" } else { "OFF" }));
        }
    }

    ToolCallResult::text(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tv::{ContentItem, PowerStatus, SystemInformation, VolumeInformation};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fake TV that records calls and returns canned answers.
    #[derive(Default)]
    struct FakeTv {
        calls: Mutex<Vec<String>>,
        display_off: bool,
    }

    impl FakeTv {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TvControl for FakeTv {
        async fn system_information(&self) -> Result<SystemInformation> {
            self.record("system_information");
            Ok(SystemInformation {
                product: "TV".to_string(),
                model: "KJ-55X".to_string(),
                name: "BRAVIA".to_string(),
                ..Default::default()
            })
        }

        async fn power_status(&self) -> Result<PowerStatus> {
            self.record("power_status");
            Ok(PowerStatus::Active)
        }

        async fn set_power_status(&self, on: bool) -> Result<()> {
            self.record(format!("set_power_status({})", on));
            Ok(())
        }

        async fn content_list(&self, source: &str) -> Result<Vec<ContentItem>> {
            self.record(format!("content_list({})", source));
            Ok(vec![ContentItem {
                uri: "tv:isdbt?trip=1".to_string(),
                title: "NHK G".to_string(),
                ..Default::default()
            }])
        }

        async fn set_play_content(&self, uri: &str) -> Result<()> {
            self.record(format!("set_play_content({})", uri));
            Ok(())
        }

        async fn volume_information(&self) -> Result<VolumeInformation> {
            self.record("volume_information");
            if self.display_off {
                return Err(FjernError::DisplayOff);
            }
            Ok(VolumeInformation {
                target: "speaker".to_string(),
                volume: 20,
                min_volume: 0,
                max_volume: 100,
                mute: false,
            })
        }

        async fn set_audio_volume(&self, target: &str, volume: u32) -> Result<()> {
            self.record(format!("set_audio_volume({}, {})", target, volume));
            Ok(())
        }

        async fn set_audio_mute(&self, mute: bool) -> Result<()> {
            self.record(format!("set_audio_mute({})", mute));
            Ok(())
        }
    }

    fn fake() -> (Arc<FakeTv>, Arc<dyn TvControl>) {
        let fake = Arc::new(FakeTv::default());
        let tv: Arc<dyn TvControl> = fake.clone();
        (fake, tv)
    }

    #[test]
    fn test_tool_catalog() {
        let tools = get_tools();
        assert_eq!(tools.len(), 7);
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"setPowerStatus"));
        assert!(names.contains(&"getVolumeInformation"));
        // Every schema is an object schema.
        for tool in &tools {
            assert_eq!(tool.input_schema["type"], "object");
            assert!(!tool.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_power_status_carries_raw_json() {
        let (_, tv) = fake();
        let result = execute(&tv, "getPowerStatus", None).await;
        assert!(result.is_error.is_none());
        // Summary first, raw wire value second.
        assert_eq!(result.content.len(), 2);
        assert!(result.joined_text().contains("ON"));
        assert!(result.joined_text().contains("\"active\""));
    }

    #[tokio::test]
    async fn test_set_power_status_on() {
        let (fake, tv) = fake();
        let result = execute(&tv, "setPowerStatus", Some(json!({ "status": "on" }))).await;
        assert!(result.is_error.is_none());
        assert_eq!(fake.calls(), vec!["set_power_status(true)"]);
    }

    #[tokio::test]
    async fn test_set_power_status_rejects_bad_status() {
        let (fake, tv) = fake();
        let result = execute(&tv, "setPowerStatus", Some(json!({ "status": "sideways" }))).await;
        assert_eq!(result.is_error, Some(true));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_content_list_defaults_to_terrestrial() {
        let (fake, tv) = fake();
        let result = execute(&tv, "getContentList", None).await;
        assert!(result.is_error.is_none());
        assert_eq!(fake.calls(), vec!["content_list(tv:isdbt)"]);
        assert!(result.joined_text().contains("NHK G"));
        assert!(result.joined_text().contains("setPlayContent"));
    }

    #[tokio::test]
    async fn test_set_play_content_requires_uri() {
        let (_, tv) = fake();
        let result = execute(&tv, "setPlayContent", Some(json!({}))).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_set_audio_volume_validates_range() {
        let (fake, tv) = fake();
        let result = execute(&tv, "setAudioVolume", Some(json!({ "volume": "150" }))).await;
        assert_eq!(result.is_error, Some(true));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_audio_volume_accepts_number() {
        let (fake, tv) = fake();
        let result = execute(&tv, "setAudioVolume", Some(json!({ "volume": 30 }))).await;
        assert!(result.is_error.is_none());
        assert_eq!(fake.calls(), vec!["set_audio_volume(speaker, 30)"]);
    }

    #[tokio::test]
    async fn test_set_audio_volume_and_mute_together() {
        let (fake, tv) = fake();
        let result = execute(
            &tv,
            "setAudioVolume",
            Some(json!({ "volume": "10", "mute": true })),
        )
        .await;
        assert!(result.is_error.is_none());
        assert_eq!(
            fake.calls(),
            vec!["set_audio_volume(speaker, 10)", "set_audio_mute(true)"]
        );
        assert!(result.joined_text().contains("Mute is now ON"));
    }

    #[tokio::test]
    async fn test_set_audio_volume_requires_something() {
        let (_, tv) = fake();
        let result = execute(&tv, "setAudioVolume", Some(json!({}))).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_volume_information_display_off() {
        let fake = Arc::new(FakeTv {
            display_off: true,
            ..Default::default()
        });
        let tv: Arc<dyn TvControl> = fake;
        let result = execute(&tv, "getVolumeInformation", None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result.joined_text().contains("Turn the TV on first"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (_, tv) = fake();
        let result = execute(&tv, "makePopcorn", None).await;
        assert_eq!(result.is_error, Some(true));
    }
}
