//! JSON frames exchanged over the realtime socket.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use songtailor_core::ticket::TicketPatch;
use songtailor_core::types::DbId;

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving updates for one ticket (replaces any earlier watch).
    Watch { ticket_id: DbId },
    /// Stop receiving ticket updates.
    Unwatch,
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "watching")]
    Watching { ticket_id: DbId },
    #[serde(rename = "unwatched")]
    Unwatched,
    #[serde(rename = "ticket.updated")]
    TicketUpdated { ticket_id: DbId, patch: TicketPatch },
    #[serde(rename = "ticket.deleted")]
    TicketDeleted { ticket_id: DbId },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    /// Encode as a text frame.
    pub fn to_frame(&self) -> Message {
        match serde_json::to_string(self) {
            Ok(json) => Message::Text(json.into()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode WebSocket frame");
                Message::Text(r#"{"type":"error","message":"encoding failed"}"#.into())
            }
        }
    }
}
