//! WebSocket handler for live pin state change streaming.

use crate::web::SharedState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::State;
use axum::{extract::WebSocketUpgrade, response::Response};
use futures_util::{SinkExt, StreamExt};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

/// WebSocket upgrade handler.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection: forward every confirmed pin state change
/// to the client until either side disconnects.
async fn handle_websocket(socket: WebSocket, state: SharedState) {
    let client_id = uuid::Uuid::new_v4().to_string();
    info!("WebSocket client connected: {}", client_id);

    let (mut sender, mut receiver) = socket.split();
    let rx = state.store.notifier().subscribe();

    // Drain incoming frames; clients only send control traffic.
    let client_id_recv = client_id.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    info!("WebSocket client {} disconnected", client_id_recv);
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    debug!("keepalive from {}", client_id_recv);
                }
                Ok(other) => {
                    debug!("ignoring message from {}: {:?}", client_id_recv, other);
                }
                Err(e) => {
                    warn!("WebSocket error for client {}: {}", client_id_recv, e);
                    break;
                }
            }
        }
    });

    // Forward broadcast events. A lagged receiver skips ahead; delivery is
    // best-effort by design.
    let client_id_send = client_id.clone();
    let send_task = tokio::spawn(async move {
        let mut events = BroadcastStream::new(rx);
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json_string) => {
                        if let Err(e) = sender.send(Message::Text(json_string)).await {
                            warn!("failed to send to client {}: {}", client_id_send, e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("failed to serialize event for {}: {}", client_id_send, e);
                    }
                },
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    debug!("client {} lagged, skipped {} events", client_id_send, missed);
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = recv_task => {
            debug!("receive task completed for client {}", client_id);
        }
        _ = send_task => {
            debug!("send task completed for client {}", client_id);
        }
    }

    info!("WebSocket client disconnected: {}", client_id);
}
