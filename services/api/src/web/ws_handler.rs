//! services/api/src/web/ws_handler.rs
//!
//! The subscription channel for a widget UI. Each connection receives the full
//! state on connect and after every change, and may issue commands.

use crate::error::ApiError;
use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    reply_task::spawn_reply,
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New widget subscriber connected");

    let (mut sender, mut receiver) = socket.split();
    let mut updates = app_state.updates.clone();

    // --- 1. Initial Snapshot ---
    let initial = ServerMessage::Snapshot {
        state: updates.borrow_and_update().clone(),
    };
    if send_server_message(&mut sender, &initial).await.is_err() {
        error!("Failed to send initial snapshot.");
        return;
    }

    // --- 2. Main Loop ---
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    info!("Widget state channel closed.");
                    break;
                }
                let snapshot = ServerMessage::Snapshot {
                    state: updates.borrow_and_update().clone(),
                };
                if send_server_message(&mut sender, &snapshot).await.is_err() {
                    warn!("Failed to push snapshot, dropping subscriber.");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = handle_text_message(text.as_str(), &app_state).await {
                        if send_server_message(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Widget subscriber disconnected.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    }
}

/// Applies one client command. Returns an error message for the client when
/// the command is refused; successful commands are answered by the next snapshot.
async fn handle_text_message(text: &str, app_state: &Arc<AppState>) -> Option<ServerMessage> {
    let command = match serde_json::from_str::<ClientMessage>(text) {
        Ok(command) => command,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return Some(ServerMessage::Error {
                code: "invalid_message".to_string(),
                message: e.to_string(),
                retry_after_ms: None,
            });
        }
    };
    debug!(?command, "Widget command received");

    let result = {
        let mut widget = app_state.widget.lock().await;
        match command {
            ClientMessage::Open => widget.open().await,
            ClientMessage::Close => widget.close().await,
            ClientMessage::Toggle => widget.toggle_open().await.map(|_| ()),
            ClientMessage::SetLanguage { code } => widget.set_language(&code).await.map(|_| ()),
            ClientMessage::Send { text } => match widget.send_user_message(&text).await {
                Ok(admitted) => {
                    spawn_reply(app_state.clone());
                    admitted.saved
                }
                Err(e) => Err(e),
            },
        }
    };

    result.err().map(|e| {
        let body = ApiError::from(e).body();
        ServerMessage::Error {
            code: body.code,
            message: body.message,
            retry_after_ms: body.retry_after_ms,
        }
    })
}

async fn send_server_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), ApiError> {
    let json = serde_json::to_string(message)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize server message: {}", e)))?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}
