//! JSON-RPC client for the Sony Bravia IP-control API.
//!
//! The TV exposes service endpoints (`/sony/system`, `/sony/avContent`,
//! `/sony/audio`) that accept JSON-RPC envelopes authenticated with the
//! `X-Auth-PSK` header.

use crate::error::{FjernError, Result};
use crate::tv::types::{ContentItem, PowerStatus, SystemInformation, VolumeInformation};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Bravia error code for "Display Is Turned off".
const ERROR_DISPLAY_OFF: i64 = 40005;

/// Default timeout for TV requests. The TV can be slow to wake.
const TV_TIMEOUT_SECS: u64 = 10;

/// The TV operations the tool layer needs. Implemented by [`BraviaClient`]
/// and by fakes in tests.
#[async_trait]
pub trait TvControl: Send + Sync {
    async fn system_information(&self) -> Result<SystemInformation>;
    async fn power_status(&self) -> Result<PowerStatus>;
    async fn set_power_status(&self, on: bool) -> Result<()>;
    async fn content_list(&self, source: &str) -> Result<Vec<ContentItem>>;
    async fn set_play_content(&self, uri: &str) -> Result<()>;
    async fn volume_information(&self) -> Result<VolumeInformation>;
    async fn set_audio_volume(&self, target: &str, volume: u32) -> Result<()>;
    async fn set_audio_mute(&self, mute: bool) -> Result<()>;
}

/// HTTP client for a single Bravia TV.
pub struct BraviaClient {
    http: reqwest::Client,
    base_url: String,
    psk: String,
    next_id: AtomicU32,
}

impl BraviaClient {
    /// Create a client for the TV at `base_url` (e.g. `http://192.168.2.250`).
    pub fn new(base_url: &str, psk: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TV_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            psk: psk.to_string(),
            next_id: AtomicU32::new(1),
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a JSON-RPC command to one of the TV's service endpoints and
    /// return the `result` field.
    pub async fn rpc(
        &self,
        endpoint: &str,
        method: &str,
        version: &str,
        params: Value,
    ) -> Result<Value> {
        let payload = build_payload(method, version, params, self.next_id.fetch_add(1, Ordering::Relaxed));
        let url = format!("{}{}", self.base_url, endpoint);

        debug!(%url, %method, "Sending RPC to TV");

        let response = self
            .http
            .post(&url)
            .header("X-Auth-PSK", &self.psk)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FjernError::TvUnreachable(self.base_url.clone())
                } else {
                    FjernError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, %method, "HTTP error from TV");
            return Err(FjernError::TvHttp(format!(
                "{} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        let body: Value = response.json().await?;
        debug!(%method, "Received RPC response from TV");

        extract_result(body, method)
    }

    /// Unwrap the `[{ ... }]`-style result the Bravia API likes to return.
    fn first_result(result: Value) -> Value {
        match result {
            Value::Array(mut items) if !items.is_empty() => items.remove(0),
            other => other,
        }
    }
}

/// Build the JSON-RPC envelope the TV expects.
fn build_payload(method: &str, version: &str, params: Value, id: u32) -> Value {
    // The TV insists on params being an array.
    let params = match params {
        Value::Array(_) => params,
        Value::Null => json!([]),
        other => json!([other]),
    };

    json!({
        "method": method,
        "params": params,
        "version": version,
        "id": id,
    })
}

/// Pull `result` out of a response body, mapping RPC errors.
fn extract_result(body: Value, method: &str) -> Result<Value> {
    if let Some(error) = body.get("error") {
        let code = error.get(0).and_then(Value::as_i64).unwrap_or(-1);
        let message = error
            .get(1)
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();

        warn!(%method, code, %message, "TV RPC error");

        if code == ERROR_DISPLAY_OFF {
            return Err(FjernError::DisplayOff);
        }
        return Err(FjernError::TvRpc { code, message });
    }

    body.get("result")
        .cloned()
        .ok_or_else(|| FjernError::TvRpc {
            code: -1,
            message: format!("Response to {} had neither result nor error", method),
        })
}

#[async_trait]
impl TvControl for BraviaClient {
    async fn system_information(&self) -> Result<SystemInformation> {
        let result = self
            .rpc("/sony/system", "getSystemInformation", "1.0", json!([]))
            .await?;
        Ok(serde_json::from_value(Self::first_result(result))?)
    }

    async fn power_status(&self) -> Result<PowerStatus> {
        let result = self
            .rpc("/sony/system", "getPowerStatus", "1.0", json!([]))
            .await?;
        let status = Self::first_result(result);
        let status = status.get("status").and_then(Value::as_str).unwrap_or("");
        Ok(PowerStatus::from_api(status))
    }

    async fn set_power_status(&self, on: bool) -> Result<()> {
        self.rpc(
            "/sony/system",
            "setPowerStatus",
            "1.0",
            json!([{ "status": on }]),
        )
        .await?;
        Ok(())
    }

    async fn content_list(&self, source: &str) -> Result<Vec<ContentItem>> {
        let result = self
            .rpc(
                "/sony/avContent",
                "getContentList",
                "1.0",
                json!([{ "stIdx": 0, "cnt": 100, "source": source }]),
            )
            .await?;
        // Result shape: [[ {uri, title, ...}, ... ]]
        Ok(serde_json::from_value(Self::first_result(result))?)
    }

    async fn set_play_content(&self, uri: &str) -> Result<()> {
        self.rpc(
            "/sony/avContent",
            "setPlayContent",
            "1.0",
            json!([{ "uri": uri }]),
        )
        .await?;
        Ok(())
    }

    async fn volume_information(&self) -> Result<VolumeInformation> {
        let result = self
            .rpc("/sony/audio", "getVolumeInformation", "1.0", json!([]))
            .await?;
        // Result shape: [[ {target, volume, ...}, ... ]]; take the first target.
        let targets = Self::first_result(result);
        let first = Self::first_result(targets);
        Ok(serde_json::from_value(first)?)
    }

    async fn set_audio_volume(&self, target: &str, volume: u32) -> Result<()> {
        self.rpc(
            "/sony/audio",
            "setAudioVolume",
            "1.0",
            json!([{ "volume": volume.to_string(), "target": target }]),
        )
        .await?;
        Ok(())
    }

    async fn set_audio_mute(&self, mute: bool) -> Result<()> {
        self.rpc(
            "/sony/audio",
            "setAudioMute",
            "1.0",
            json!([{ "status": mute }]),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_payload_wraps_params_in_array() {
        let payload = build_payload("setPowerStatus", "1.0", json!({ "status": true }), 7);
        assert_eq!(payload["method"], "setPowerStatus");
        assert_eq!(payload["version"], "1.0");
        assert_eq!(payload["id"], 7);
        assert!(payload["params"].is_array());
        assert_eq!(payload["params"][0]["status"], true);

        let empty = build_payload("getPowerStatus", "1.0", Value::Null, 8);
        assert_eq!(empty["params"], json!([]));
    }

    #[test]
    fn test_extract_result_maps_errors() {
        let ok = extract_result(json!({ "result": [{"status": "active"}], "id": 1 }), "getPowerStatus");
        assert!(ok.is_ok());

        let err = extract_result(json!({ "error": [40005, "Display Is Turned off"], "id": 1 }), "getVolumeInformation");
        assert!(matches!(err, Err(FjernError::DisplayOff)));

        let err = extract_result(json!({ "error": [7, "Illegal State"], "id": 1 }), "setPlayContent");
        match err {
            Err(FjernError::TvRpc { code, message }) => {
                assert_eq!(code, 7);
                assert_eq!(message, "Illegal State");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_power_status_roundtrip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sony/system"))
            .and(header("X-Auth-PSK", "sekrit"))
            .and(body_partial_json(json!({ "method": "getPowerStatus" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{ "status": "standby" }],
                "id": 1
            })))
            .mount(&server)
            .await;

        let client = BraviaClient::new(&server.uri(), "sekrit").unwrap();
        let status = client.power_status().await.unwrap();
        assert_eq!(status, PowerStatus::Standby);
    }

    #[tokio::test]
    async fn test_content_list_parses_nested_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sony/avContent"))
            .and(body_partial_json(json!({ "method": "getContentList" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [[
                    { "uri": "tv:isdbt?trip=1", "title": "NHK G", "dispNum": "011" },
                    { "uri": "tv:isdbt?trip=2", "title": "NTV", "dispNum": "041" }
                ]],
                "id": 2
            })))
            .mount(&server)
            .await;

        let client = BraviaClient::new(&server.uri(), "sekrit").unwrap();
        let list = client.content_list("tv:isdbt").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].title, "NTV");
    }

    #[tokio::test]
    async fn test_http_error_is_mapped() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sony/system"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = BraviaClient::new(&server.uri(), "wrong").unwrap();
        let err = client.power_status().await.unwrap_err();
        assert!(matches!(err, FjernError::TvHttp(_)));
    }
}
