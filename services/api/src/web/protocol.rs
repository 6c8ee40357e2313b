//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the widget UI and the service.

use chat_widget_core::WidgetState;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Widget UI) TO the Server
//=========================================================================================

/// The commands a connected widget UI can issue.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Open,
    Close,
    Toggle,
    /// A user-typed message, subject to rate limiting.
    Send { text: String },
    SetLanguage { code: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Widget UI)
//=========================================================================================

/// Represents the structured text messages the server pushes to the UI.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full widget state. Sent on connect and after every change.
    Snapshot { state: WidgetState },

    /// A command was refused. `retry_after_ms` accompanies rate limit rejections.
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_ms: Option<i64>,
    },
}
