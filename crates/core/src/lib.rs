//! Song Tailor domain core.
//!
//! Zero internal dependencies so the persistence layer, the HTTP server and
//! any future tooling can share one definition of a ticket and its board.
//!
//! - [`ticket`] -- the ticket entity, track references, partial patches.
//! - [`status`] -- the ticket lifecycle and its forward/reset transitions.
//! - [`board`] -- the Ticket Board Engine: bucket ordering, reorder,
//!   categorization, and write-through sync against a [`board::TicketStore`].

pub mod board;
pub mod error;
pub mod roles;
pub mod status;
pub mod ticket;
pub mod types;
