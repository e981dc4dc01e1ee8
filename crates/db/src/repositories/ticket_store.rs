//! [`TicketStore`] backed by Postgres.

use async_trait::async_trait;
use songtailor_core::board::{StoreError, TicketScope, TicketStore};
use songtailor_core::error::CoreError;
use songtailor_core::ticket::{Ticket, TicketPatch};
use songtailor_core::types::DbId;
use sqlx::PgPool;

use crate::models::ticket::into_tickets;
use crate::repositories::TicketRepo;

/// Board persistence over [`TicketRepo`].
///
/// Missing rows surface as [`CoreError::NotFound`] and rows with an unknown
/// status as [`CoreError::DataIntegrity`], both boxed so the board can tell
/// them apart from connection failures.
#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn fetch_all(&self, scope: TicketScope) -> Result<Vec<Ticket>, StoreError> {
        let rows = TicketRepo::list(&self.pool, scope).await?;
        Ok(into_tickets(rows)?)
    }

    async fn update(&self, id: DbId, patch: &TicketPatch) -> Result<(), StoreError> {
        let updated = TicketRepo::update_fields(&self.pool, id, patch)
            .await
            .inspect_err(|e| tracing::warn!(ticket_id = id, error = %e, "Ticket update failed"))?;
        if !updated {
            return Err(CoreError::ticket_not_found(id).into());
        }
        Ok(())
    }

    async fn upsert_many(&self, tickets: &[Ticket]) -> Result<(), StoreError> {
        let written = TicketRepo::upsert_many(&self.pool, tickets)
            .await
            .inspect_err(|e| {
                tracing::warn!(count = tickets.len(), error = %e, "Ticket batch upsert failed")
            })?;
        tracing::debug!(count = written, "Upserted ticket batch");
        Ok(())
    }

    async fn delete(&self, id: DbId) -> Result<(), StoreError> {
        let deleted = TicketRepo::delete(&self.pool, id)
            .await
            .inspect_err(|e| tracing::warn!(ticket_id = id, error = %e, "Ticket delete failed"))?;
        if !deleted {
            return Err(CoreError::ticket_not_found(id).into());
        }
        Ok(())
    }
}
