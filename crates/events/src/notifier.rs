//! Announces newly created tickets to Discord.
//!
//! [`CreationNotifier`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and, for every `ticket.created`, posts an embed built from the ticket
//! snapshot in the event. Delivery is best-effort: failures are logged and
//! never reach the request that created the ticket.

use tokio::sync::broadcast;

use crate::bus::DomainEvent;
use crate::delivery::discord::{creation_message, DiscordError, DiscordWebhook};

/// Background service delivering creation announcements.
pub struct CreationNotifier {
    webhook: DiscordWebhook,
}

impl CreationNotifier {
    pub fn new(webhook: DiscordWebhook) -> Self {
        Self { webhook }
    }

    /// Run the notification loop until the bus is dropped.
    ///
    /// Each delivery runs on its own task so a slow retry schedule never
    /// holds up later events.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let webhook = self.webhook.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::notify(&webhook, &event).await {
                            tracing::error!(
                                error = %e,
                                ticket_id = event.ticket_id,
                                "Ticket creation notification failed"
                            );
                        }
                    });
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Creation notifier lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, creation notifier shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver the announcement for one event.
    ///
    /// Returns `Ok(false)` for events that are not ticket creations (or
    /// whose payload is not a ticket) without contacting Discord.
    pub async fn notify(webhook: &DiscordWebhook, event: &DomainEvent) -> Result<bool, DiscordError> {
        let Some(ticket) = event.created_ticket() else {
            return Ok(false);
        };
        webhook.deliver(&creation_message(&ticket)).await?;
        tracing::info!(ticket_id = ticket.id, "Ticket creation announced");
        Ok(true)
    }
}
