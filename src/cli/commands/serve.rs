//! HTTP tool server for remote agents.
//!
//! Exposes the TV tools over SSE (GET /sse + POST /messages) or plain
//! HTTP JSON-RPC (POST /mcp), depending on the configured transport.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ServerTransport, Settings};
use crate::error::{FjernError, Result};
use crate::mcp::McpService;
use crate::tv::BraviaClient;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    service: McpService,
    sessions: Mutex<HashMap<Uuid, mpsc::Sender<Event>>>,
}

/// Run the tool server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    transport: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'fjern doctor' for detailed diagnostics.");
        return Err(e);
    }

    let transport = match transport {
        Some(t) => t
            .parse::<ServerTransport>()
            .map_err(FjernError::Config)?,
        None => settings.server.transport,
    };
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    // Preflight guarantees host and psk are present.
    let base_url = settings
        .tv
        .base_url()
        .ok_or_else(|| FjernError::Config("TV host not configured".to_string()))?;
    let psk = settings.tv.psk.clone().unwrap_or_default();
    let tv = BraviaClient::new(&base_url, &psk)?;

    let state = Arc::new(AppState {
        service: McpService::new(Arc::new(tv)),
        sessions: Mutex::new(HashMap::new()),
    });

    let app = router(transport, state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Fjern Tool Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("TV", &base_url);
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    match transport {
        ServerTransport::Sse => {
            Output::kv("SSE stream", "GET  /sse");
            Output::kv("Messages", "POST /messages?sessionId=...");
        }
        ServerTransport::Http => {
            Output::kv("JSON-RPC", "POST /mcp");
        }
    }
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(transport: ServerTransport, state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let router = Router::new().route("/health", get(health));
    let router = match transport {
        ServerTransport::Sse => router
            .route("/sse", get(open_sse))
            .route("/messages", post(post_message)),
        ServerTransport::Http => router.route("/mcp", post(post_mcp)),
    };

    router.layer(cors).with_state(state)
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Open an SSE session. The first event tells the client where to POST
/// its requests; responses come back as `message` events on this stream.
async fn open_sse(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<Event>(32);

    state
        .sessions
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(session_id, tx);
    info!(%session_id, "SSE session opened");

    let endpoint = Event::default().event("message-port").data(
        serde_json::json!({ "endpoint": format!("/messages?sessionId={}", session_id) })
            .to_string(),
    );

    // Removes the session once the client disconnects and the stream drops.
    let guard = SessionGuard {
        state: state.clone(),
        session_id,
    };

    let stream = stream::once(async move { Ok(endpoint) }).chain(
        ReceiverStream::new(rx).map(move |event| {
            let _ = &guard;
            Ok(event)
        }),
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

struct SessionGuard {
    state: Arc<AppState>,
    session_id: Uuid,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.session_id);
        info!(session_id = %self.session_id, "SSE session closed");
    }
}

#[derive(Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Uuid,
}

/// Accept a JSON-RPC request for an SSE session. The response is pushed
/// over the session's event stream; this endpoint only acknowledges.
async fn post_message(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> impl IntoResponse {
    let sender = state
        .sessions
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(&query.session_id)
        .cloned();

    let Some(sender) = sender else {
        warn!(session_id = %query.session_id, "Message for unknown session");
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Unknown session" })),
        );
    };

    let response = state.service.handle_raw(&body).await;
    debug!(session_id = %query.session_id, "Pushing response over SSE");

    let event = Event::default().event("message").data(
        serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string()),
    );

    if sender.send(event).await.is_err() {
        state
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&query.session_id);
        return (
            StatusCode::GONE,
            Json(serde_json::json!({ "error": "Session closed" })),
        );
    }

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "accepted" })),
    )
}

/// Plain HTTP transport: one JSON-RPC request in, one response out.
async fn post_mcp(State(state): State<Arc<AppState>>, body: String) -> impl IntoResponse {
    let response = state.service.handle_raw(&body).await;
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as FjernResult;
    use crate::tv::{ContentItem, PowerStatus, SystemInformation, TvControl, VolumeInformation};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct IdleTv;

    #[async_trait]
    impl TvControl for IdleTv {
        async fn system_information(&self) -> FjernResult<SystemInformation> {
            Ok(SystemInformation::default())
        }
        async fn power_status(&self) -> FjernResult<PowerStatus> {
            Ok(PowerStatus::Active)
        }
        async fn set_power_status(&self, _on: bool) -> FjernResult<()> {
            Ok(())
        }
        async fn content_list(&self, _source: &str) -> FjernResult<Vec<ContentItem>> {
            Ok(vec![])
        }
        async fn set_play_content(&self, _uri: &str) -> FjernResult<()> {
            Ok(())
        }
        async fn volume_information(&self) -> FjernResult<VolumeInformation> {
            Ok(VolumeInformation::default())
        }
        async fn set_audio_volume(&self, _target: &str, _volume: u32) -> FjernResult<()> {
            Ok(())
        }
        async fn set_audio_mute(&self, _mute: bool) -> FjernResult<()> {
            Ok(())
        }
    }

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            service: McpService::new(Arc::new(IdleTv)),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(ServerTransport::Http, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_http_transport_tools_list() {
        let app = router(ServerTransport::Http, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["result"]["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_message_for_unknown_session() {
        let app = router(ServerTransport::Sse, test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/messages?sessionId={}", Uuid::new_v4()))
                    .body(Body::from(
                        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_message_pushed_to_session() {
        let state = test_state();
        let session_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel::<Event>(4);
        state
            .sessions
            .lock()
            .unwrap()
            .insert(session_id, tx);

        let app = router(ServerTransport::Sse, state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/messages?sessionId={}", session_id))
                    .body(Body::from(
                        r#"{"jsonrpc":"2.0","id":7,"method":"initialize","params":{}}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.recv().await.is_some());
    }
}
