use std::sync::Arc;
use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::models::{ClientEvent, ConnectionId};
use crate::ws::connctx::{ConnCtx, Flow};
use crate::ws::hub::SessionHub;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    debug!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state.hub.clone()))
}

/// Tears a connection down when dropped, whichever way the socket ended.
struct DisconnectGuard {
    hub: Arc<SessionHub>,
    connection_id: ConnectionId,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        self.hub.disconnect(&self.connection_id);
    }
}

/// Handle WebSocket connection
pub async fn handle_socket(socket: WebSocket, hub: Arc<SessionHub>) {
    let (connection_id, mut outbound) = hub.connect();
    let _guard = DisconnectGuard {
        hub: hub.clone(),
        connection_id: connection_id.clone(),
    };
    info!("WebSocket connection established with connection_id: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // Drain this connection's queue into the socket, in order
    let writer_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(event.as_ref()) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize event for {}: {}", writer_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                debug!("Send failed, {} is gone", writer_id);
                break;
            }
        }
    });

    // Read client events until the socket closes or the client leaves
    let reader_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut ctx = ConnCtx::new(connection_id);
        while let Some(msg) = receiver.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!("WebSocket error on {}: {}", ctx.connection_id, e);
                    break;
                }
            };

            let event: ClientEvent = match serde_json::from_str(&text) {
                Ok(event) => event,
                Err(e) => {
                    debug!("Ignoring unparseable message from {}: {}", ctx.connection_id, e);
                    continue;
                }
            };

            if ctx.handle(&reader_hub, event) == Flow::Close {
                break;
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
    info!("WebSocket connection terminated");
}
