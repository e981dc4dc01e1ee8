//! WebSocket infrastructure for realtime ticket updates.
//!
//! Provides connection management with per-connection ticket watches,
//! heartbeat monitoring, and the HTTP upgrade handler.

mod handler;
mod heartbeat;
pub mod manager;
pub mod messages;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
pub use messages::{ClientMessage, ServerMessage};
