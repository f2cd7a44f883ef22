//! WebSocket handler for request/reply rolling
//!
//! Every text or binary frame is one batch request. The reply is sent
//! before the next frame is read, so a connection behaves like a strict
//! request/reply socket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tracing::{debug, info};

use super::AppState;

/// Handle WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!("WebSocket connected: {}", conn_id);

    while let Some(result) = socket.recv().await {
        let raw = match result {
            Ok(Message::Text(text)) => text.as_str().as_bytes().to_vec(),
            Ok(Message::Binary(bytes)) => bytes.to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("WebSocket {} receive error: {}", conn_id, e);
                break;
            }
        };

        let reply = reply_text(&state, &raw);
        if socket.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }

    info!("WebSocket disconnected: {}", conn_id);
}

/// Process a request and render the reply, error or not
fn reply_text(state: &AppState, raw: &[u8]) -> String {
    match state.run_batch(raw) {
        Ok(response) => response.to_string(),
        Err(err) => err.to_response().to_string(),
    }
}
