//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`DomainEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use songtailor_core::ticket::{Ticket, TicketPatch};
use songtailor_core::types::DbId;
use tokio::sync::broadcast;

/// Event type names published on the bus.
pub mod event_types {
    pub const TICKET_CREATED: &str = "ticket.created";
    pub const TICKET_UPDATED: &str = "ticket.updated";
    pub const TICKET_DELETED: &str = "ticket.deleted";
}

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened to a ticket.
///
/// The payload shape depends on `event_type`: the full ticket for
/// `ticket.created`, a [`TicketPatch`] for `ticket.updated`, and an empty
/// object for `ticket.deleted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"ticket.created"`.
    pub event_type: String,
    pub ticket_id: DbId,
    pub actor_user_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>, ticket_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            ticket_id,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// `ticket.created` carrying a snapshot of the new ticket.
    pub fn ticket_created(ticket: &Ticket) -> Self {
        Self::new(event_types::TICKET_CREATED, ticket.id)
            .with_actor(ticket.user_id)
            .with_payload(serde_json::to_value(ticket).unwrap_or_default())
    }

    /// `ticket.updated` carrying the fields that changed.
    pub fn ticket_updated(ticket_id: DbId, patch: &TicketPatch) -> Self {
        Self::new(event_types::TICKET_UPDATED, ticket_id)
            .with_payload(serde_json::to_value(patch).unwrap_or_default())
    }

    pub fn ticket_deleted(ticket_id: DbId) -> Self {
        Self::new(event_types::TICKET_DELETED, ticket_id)
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// The ticket snapshot of a `ticket.created` event.
    pub fn created_ticket(&self) -> Option<Ticket> {
        if self.event_type != event_types::TICKET_CREATED {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }

    /// The patch of a `ticket.updated` event.
    pub fn update_patch(&self) -> Option<TicketPatch> {
        if self.event_type != event_types::TICKET_UPDATED {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use songtailor_events::bus::{DomainEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DomainEvent::ticket_deleted(7));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is silently dropped.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use songtailor_core::status::TicketStatus;

    use super::*;

    fn ticket() -> Ticket {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Ticket::new(12, "Recital edit", 3, created)
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DomainEvent::ticket_deleted(5).with_actor(1));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.event_type, event_types::TICKET_DELETED);
        assert_eq!(e1.ticket_id, 5);
        assert_eq!(e1.actor_user_id, Some(1));
        assert_eq!(e2.ticket_id, 5);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        EventBus::default().publish(DomainEvent::ticket_deleted(1));
    }

    #[test]
    fn created_event_round_trips_ticket() {
        let event = DomainEvent::ticket_created(&ticket());
        assert_eq!(event.actor_user_id, Some(3));
        let snapshot = event.created_ticket().expect("ticket payload");
        assert_eq!(snapshot.title, "Recital edit");
        assert!(event.update_patch().is_none());
    }

    #[test]
    fn updated_event_carries_patch() {
        let patch = TicketPatch {
            status: Some(TicketStatus::Done),
            ..TicketPatch::default()
        };
        let event = DomainEvent::ticket_updated(9, &patch);
        assert_eq!(event.payload, serde_json::json!({"status": "done"}));
        assert_eq!(event.update_patch(), Some(patch));
        assert!(event.created_ticket().is_none());
    }
}
