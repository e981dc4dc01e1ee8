use std::sync::Arc;

use songtailor_events::{event_types, DomainEvent};
use tokio::sync::broadcast;

use crate::ws::{ServerMessage, WsManager};

/// Forwards `ticket.updated` and `ticket.deleted` to every connection
/// watching the ticket. Creation events are not relayed.
pub struct RealtimeRelay {
    ws_manager: Arc<WsManager>,
}

impl RealtimeRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the relay loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.forward(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Realtime relay lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, realtime relay shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event; returns how many connections received it.
    pub async fn forward(&self, event: &DomainEvent) -> usize {
        let Some(message) = to_server_message(event) else {
            return 0;
        };
        let sent = self
            .ws_manager
            .send_to_watchers(event.ticket_id, message.to_frame())
            .await;
        if sent > 0 {
            tracing::debug!(
                event_type = %event.event_type,
                ticket_id = event.ticket_id,
                sent,
                "Relayed ticket event"
            );
        }
        sent
    }
}

fn to_server_message(event: &DomainEvent) -> Option<ServerMessage> {
    match event.event_type.as_str() {
        event_types::TICKET_UPDATED => event.update_patch().map(|patch| {
            ServerMessage::TicketUpdated {
                ticket_id: event.ticket_id,
                patch,
            }
        }),
        event_types::TICKET_DELETED => Some(ServerMessage::TicketDeleted {
            ticket_id: event.ticket_id,
        }),
        _ => None,
    }
}
