//! WS endpoint NapCat connects to and pushes OneBot V11 event frames over.
//!
//! Unlike a peer-to-peer RPC socket, this is one-way and handshake-free:
//! NapCat reports its own `self_id` on every event rather than through a
//! separate `connect` exchange, so there's no auth challenge to run before
//! frames start flowing.

use std::sync::Arc;

use axum::{
    extract::{ws::Message, ws::WebSocket, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::StreamExt;
use tracing::{info, warn};

use crate::app::AppState;
use crate::ws::dispatch::handle_frame;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, "napcat connected");

    let (_tx, mut rx) = socket.split();

    while let Some(message) = rx.next().await {
        match message {
            Ok(Message::Text(text)) => handle_frame(&text, &state).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id, error = %e, "websocket error, closing connection");
                break;
            }
        }
    }

    info!(conn_id, "napcat disconnected");
}
