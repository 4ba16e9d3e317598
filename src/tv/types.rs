//! Typed results from the Bravia IP-control API.

use serde::{Deserialize, Serialize};

/// Power state of the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    /// The display is on.
    Active,
    /// The display is off (the TV still answers RPCs).
    Standby,
    /// Anything the TV reports that we do not recognize.
    Unknown,
}

impl PowerStatus {
    /// Parse the TV's `status` string.
    pub fn from_api(status: &str) -> Self {
        match status {
            "active" => PowerStatus::Active,
            "standby" => PowerStatus::Standby,
            _ => PowerStatus::Unknown,
        }
    }

    /// The TV's wire value for this state.
    pub fn as_api(&self) -> &'static str {
        match self {
            PowerStatus::Active => "active",
            PowerStatus::Standby => "standby",
            PowerStatus::Unknown => "unknown",
        }
    }

    /// Human-readable ON/OFF rendering used in tool results.
    pub fn as_display(&self) -> &'static str {
        match self {
            PowerStatus::Active => "ON",
            PowerStatus::Standby => "OFF",
            PowerStatus::Unknown => "unknown",
        }
    }
}

/// System information as reported by `/sony/system` `getSystemInformation`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SystemInformation {
    pub product: String,
    pub model: String,
    pub name: String,
    pub generation: String,
    pub area: String,
    pub language: String,
    #[serde(rename = "serial")]
    pub serial: String,
    #[serde(rename = "macAddr")]
    pub mac_addr: String,
}

/// Volume information as reported by `/sony/audio` `getVolumeInformation`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeInformation {
    pub target: String,
    pub volume: i64,
    pub min_volume: i64,
    pub max_volume: i64,
    pub mute: bool,
}

/// A single entry from `/sony/avContent` `getContentList`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContentItem {
    pub uri: String,
    pub title: String,
    /// Broadcast display number, when present (e.g. "011").
    #[serde(rename = "dispNum")]
    pub disp_num: Option<String>,
    pub index: Option<i64>,
}

impl ContentItem {
    /// Display label for lists: title if present, else the URI.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.uri
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_status_from_api() {
        assert_eq!(PowerStatus::from_api("active"), PowerStatus::Active);
        assert_eq!(PowerStatus::from_api("standby"), PowerStatus::Standby);
        assert_eq!(PowerStatus::from_api("???"), PowerStatus::Unknown);
        assert_eq!(PowerStatus::Active.as_display(), "ON");
        assert_eq!(PowerStatus::Standby.as_display(), "OFF");
        assert_eq!(PowerStatus::Active.as_api(), "active");
        assert_eq!(PowerStatus::Standby.as_api(), "standby");
    }

    #[test]
    fn test_volume_information_parse() {
        let info: VolumeInformation = serde_json::from_value(serde_json::json!({
            "target": "speaker",
            "volume": 18,
            "minVolume": 0,
            "maxVolume": 100,
            "mute": false
        }))
        .unwrap();
        assert_eq!(info.volume, 18);
        assert_eq!(info.max_volume, 100);
        assert!(!info.mute);
    }

    #[test]
    fn test_content_item_label() {
        let item: ContentItem = serde_json::from_value(serde_json::json!({
            "uri": "tv:isdbt?trip=32738.32738.1040",
            "title": "NHK G",
            "dispNum": "011"
        }))
        .unwrap();
        assert_eq!(item.label(), "NHK G");

        let untitled = ContentItem {
            uri: "extInput:hdmi?port=1".to_string(),
            ..Default::default()
        };
        assert_eq!(untitled.label(), "extInput:hdmi?port=1");
    }
}
