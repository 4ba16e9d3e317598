//! Client side of the MCP SSE transport.
//!
//! The tool server announces a per-session message endpoint as the first
//! event on the stream; JSON-RPC requests are POSTed there and the responses
//! come back over the stream, correlated by request id.

use super::protocol::*;
use super::sse::SseParser;
use crate::error::{FjernError, Result};
use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};
use url::Url;

/// The fixed Accept header the tool server requires.
pub const SSE_ACCEPT: &str = "text/event-stream";

const CLIENT_NAME: &str = "fjern";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// A connected MCP tool server session.
pub struct ToolServerClient {
    http: reqwest::Client,
    sse_url: Url,
    message_url: Url,
    pending: PendingMap,
    next_id: AtomicU64,
    request_timeout: Duration,
    server_info: Option<ServerInfo>,
}

impl ToolServerClient {
    /// Open the SSE stream, wait for the message endpoint announcement and
    /// perform the MCP initialize handshake.
    pub async fn connect(url: &str, request_timeout: Duration) -> Result<Self> {
        let sse_url = Url::parse(url)?;
        let http = reqwest::Client::new();

        let response = http
            .get(sse_url.clone())
            .header(ACCEPT, SSE_ACCEPT)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| FjernError::ToolServer(format!("SSE connect failed: {}", e)))?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (endpoint_tx, endpoint_rx) = oneshot::channel::<String>();

        // Reader task: parses the stream, announces the endpoint once and
        // routes every subsequent message to its waiting request.
        let task_pending = pending.clone();
        tokio::spawn(async move {
            let mut parser = SseParser::new();
            let mut endpoint_tx = Some(endpoint_tx);
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Tool server stream error: {}", e);
                        break;
                    }
                };
                let Ok(text) = std::str::from_utf8(&chunk) else {
                    warn!("Tool server sent non-UTF-8 data");
                    break;
                };

                for event in parser.push(text) {
                    match event.name() {
                        // The Bravia server announces the endpoint with a
                        // `message-port` event; stock MCP servers use
                        // `endpoint`.
                        "message-port" | "endpoint" => {
                            if let Some(tx) = endpoint_tx.take() {
                                let _ = tx.send(event.data);
                            }
                        }
                        "message" => {
                            route_response(&task_pending, &event.data).await;
                        }
                        other => debug!("Ignoring SSE event: {}", other),
                    }
                }
            }

            debug!("Tool server stream closed");
            // Dropping the map wakes every waiter with a recv error.
            task_pending.lock().await.clear();
        });

        let raw_endpoint = tokio::time::timeout(request_timeout, endpoint_rx)
            .await
            .map_err(|_| FjernError::Timeout)?
            .map_err(|_| {
                FjernError::ToolServer("Stream closed before endpoint announcement".to_string())
            })?;

        let message_url = resolve_message_endpoint(&sse_url, &raw_endpoint)?;
        debug!(%message_url, "Tool server session established");

        let mut client = Self {
            http,
            sse_url,
            message_url,
            pending,
            next_id: AtomicU64::new(1),
            request_timeout,
            server_info: None,
        };

        client.initialize().await?;
        Ok(client)
    }

    /// SSE endpoint this client was configured with.
    pub fn endpoint_url(&self) -> &Url {
        &self.sse_url
    }

    /// Server identity reported during the handshake.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// MCP initialize handshake followed by the initialized notification.
    async fn initialize(&mut self) -> Result<()> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        };

        let result = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| FjernError::Protocol(format!("Bad initialize result: {}", e)))?;
        self.server_info = Some(init.server_info);

        self.notify("notifications/initialized", None).await?;
        Ok(())
    }

    /// List the tools the server exposes.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result = self.request("tools/list", None).await?;
        let list: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| FjernError::Protocol(format!("Bad tools/list result: {}", e)))?;
        Ok(list.tools)
    }

    /// Invoke a tool and flatten its text content.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let params = ToolCallParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        let result = self
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await?;
        let call: ToolCallResult = serde_json::from_value(result)
            .map_err(|e| FjernError::Protocol(format!("Bad tools/call result: {}", e)))?;

        let text = call.joined_text();
        if call.is_error == Some(true) {
            return Err(FjernError::ToolServer(text));
        }
        Ok(text)
    }

    /// Send a request and wait for the correlated response on the stream.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let post = self
            .http
            .post(self.message_url.clone())
            .json(&request)
            .send()
            .await;

        if let Err(e) = post.and_then(|r| r.error_for_status()) {
            self.pending.lock().await.remove(&id);
            return Err(FjernError::ToolServer(format!(
                "POST to message endpoint failed: {}",
                e
            )));
        }

        let response = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(FjernError::ToolServer(
                    "Session closed mid-request".to_string(),
                ))
            }
            Err(_) => {
                // Nothing will ever answer this id; drop the waiter entry.
                self.pending.lock().await.remove(&id);
                return Err(FjernError::Timeout);
            }
        };

        if let Some(error) = response.error {
            return Err(FjernError::ToolServer(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }
        response
            .result
            .ok_or_else(|| FjernError::Protocol(format!("Empty result for {}", method)))
    }

    /// Fire-and-forget notification.
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let request = JsonRpcRequest::notification(method, params);
        self.http
            .post(self.message_url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| FjernError::ToolServer(format!("Notification failed: {}", e)))?;
        Ok(())
    }
}

/// Hand a streamed response to the request waiting for it.
async fn route_response(pending: &PendingMap, data: &str) {
    let response: JsonRpcResponse = match serde_json::from_str(data) {
        Ok(r) => r,
        Err(e) => {
            warn!("Unparseable message from tool server: {}", e);
            return;
        }
    };

    let Some(id) = response.id.as_ref().and_then(Value::as_u64) else {
        debug!("Server message without numeric id, ignoring");
        return;
    };

    match pending.lock().await.remove(&id) {
        Some(tx) => {
            let _ = tx.send(response);
        }
        None => debug!("Response for unknown request id {}", id),
    }
}

/// Resolve the announced endpoint against the SSE URL's origin.
///
/// The Bravia server sends JSON (`{"endpoint": "/messages?sessionId=..."}`);
/// standard servers send the URI as plain text.
fn resolve_message_endpoint(sse_url: &Url, raw: &str) -> Result<Url> {
    let uri = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value
            .get("endpoint")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                FjernError::Protocol(format!("Endpoint announcement missing 'endpoint': {}", raw))
            })?,
        Err(_) => raw.trim().to_string(),
    };

    Ok(sse_url.join(&uri)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_header_value() {
        assert_eq!(SSE_ACCEPT, "text/event-stream");
    }

    #[test]
    fn test_resolve_endpoint_from_json() {
        let sse = Url::parse("http://192.168.2.250:3000/sse").unwrap();
        let url = resolve_message_endpoint(&sse, r#"{"endpoint":"/messages?sessionId=abc"}"#)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://192.168.2.250:3000/messages?sessionId=abc"
        );
    }

    #[test]
    fn test_resolve_endpoint_from_plain_uri() {
        let sse = Url::parse("http://localhost:3000/sse").unwrap();
        let url = resolve_message_endpoint(&sse, "/messages?sessionId=xyz").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/messages?sessionId=xyz");
    }

    #[test]
    fn test_resolve_endpoint_rejects_bad_json() {
        let sse = Url::parse("http://localhost:3000/sse").unwrap();
        let err = resolve_message_endpoint(&sse, r#"{"port": 3000}"#);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_timed_out_request_is_unregistered() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        // Session whose stream never delivers a response.
        let client = ToolServerClient {
            http: reqwest::Client::new(),
            sse_url: Url::parse(&format!("{}/sse", server.uri())).unwrap(),
            message_url: Url::parse(&format!("{}/messages", server.uri())).unwrap(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            request_timeout: Duration::from_millis(50),
            server_info: None,
        };

        let err = client.request("tools/list", None).await.unwrap_err();
        assert!(matches!(err, FjernError::Timeout));
        assert!(client.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_route_response_matches_pending() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(4, tx);

        route_response(
            &pending,
            r#"{"jsonrpc":"2.0","id":4,"result":{"ok":true}}"#,
        )
        .await;

        let response = rx.await.unwrap();
        assert_eq!(response.result.unwrap()["ok"], true);
        assert!(pending.lock().await.is_empty());
    }
}
