//! Song Tailor event bus and notification infrastructure.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`] -- the ticket lifecycle event envelope.
//! - [`delivery`] -- external delivery channels (Discord webhook).
//! - [`CreationNotifier`] -- background service announcing new tickets.

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{event_types, DomainEvent, EventBus};
pub use delivery::discord::{DiscordError, DiscordWebhook};
pub use notifier::CreationNotifier;
