//! Bridges ticket events on the bus to watching WebSocket clients.

mod relay;

pub use relay::RealtimeRelay;
