//! The persistence seam of the board.
//!
//! [`TicketStore`] is implemented by the database crate for production and
//! by in-memory doubles in tests. [`BoardWrite`] is what a board operation
//! asks the store to do.

use async_trait::async_trait;

use crate::ticket::{Ticket, TicketPatch};
use crate::types::DbId;

/// Error returned by a store. Boxed so implementations keep their own types;
/// a [`CoreError`](crate::error::CoreError) inside is recognised by callers.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Which tickets a fetch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    /// Every ticket (admin board).
    All,
    /// Tickets submitted by one user.
    Owner(DbId),
}

/// Backing store for tickets.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// All tickets in scope, ordered by position ascending.
    async fn fetch_all(&self, scope: TicketScope) -> Result<Vec<Ticket>, StoreError>;

    /// Apply a partial update to one ticket.
    async fn update(&self, id: DbId, patch: &TicketPatch) -> Result<(), StoreError>;

    /// Insert-or-update every ticket, keyed by id, in a single round trip.
    async fn upsert_many(&self, tickets: &[Ticket]) -> Result<(), StoreError>;

    /// Hard-delete one ticket.
    async fn delete(&self, id: DbId) -> Result<(), StoreError>;
}

/// A persistence write produced by a board operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardWrite {
    Update { id: DbId, patch: TicketPatch },
    UpsertMany(Vec<Ticket>),
    Delete(DbId),
}

impl BoardWrite {
    /// Ids of every ticket the write touches.
    pub fn ticket_ids(&self) -> Vec<DbId> {
        match self {
            BoardWrite::Update { id, .. } | BoardWrite::Delete(id) => vec![*id],
            BoardWrite::UpsertMany(tickets) => tickets.iter().map(|t| t.id).collect(),
        }
    }

    /// Issue the write against `store`.
    pub async fn apply<S>(&self, store: &S) -> Result<(), StoreError>
    where
        S: TicketStore + ?Sized,
    {
        match self {
            BoardWrite::Update { id, patch } => store.update(*id, patch).await,
            BoardWrite::UpsertMany(tickets) => store.upsert_many(tickets).await,
            BoardWrite::Delete(id) => store.delete(*id).await,
        }
    }
}
