//! HTTP request handlers, one module per resource.

pub mod auth;
pub mod board;
pub mod profile;
pub mod tickets;
