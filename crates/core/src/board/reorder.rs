//! Drag-and-drop reorder as a plain command.
//!
//! A drop supplies three values: which ticket, which status column, and the
//! index among that column's other members. The destination bucket is then
//! renumbered in [`POSITION_STEP`] increments and written back as one batch.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::TicketStatus;
use crate::ticket::Ticket;
use crate::types::{DbId, Position, Timestamp};

use super::engine::{TicketBoard, POSITION_STEP};
use super::store::BoardWrite;

/// Relocate one ticket to `destination_index` within `destination_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderCommand {
    pub ticket_id: DbId,
    /// Column the client believes the ticket is in. A mismatch means the
    /// drag started from a stale view and the command is refused.
    #[serde(default)]
    pub source_status: Option<TicketStatus>,
    pub destination_status: TicketStatus,
    /// Index among the destination's members once the ticket is lifted out.
    /// Clamped to the bucket length.
    pub destination_index: usize,
}

impl TicketBoard {
    /// Apply a reorder and return the batched upsert of the whole
    /// destination bucket, or `None` when the drop lands where it started.
    ///
    /// The source bucket only loses a member, so its remaining positions stay
    /// distinct and are not rewritten.
    pub fn reorder(
        &mut self,
        command: &ReorderCommand,
        now: Timestamp,
    ) -> Result<Option<BoardWrite>, CoreError> {
        let id = command.ticket_id;
        let source = self.require(id)?.status;

        if let Some(expected) = command.source_status {
            if expected != source {
                return Err(CoreError::Conflict(format!(
                    "Ticket {id} is in '{source}', not '{expected}'"
                )));
            }
        }

        let destination = command.destination_status;
        let siblings = self.bucket(destination).filter(|t| t.id != id).count();
        let index = command.destination_index.min(siblings);

        if source == destination && self.index_in_bucket(id) == Some(index) {
            return Ok(None);
        }

        let (mut bucket, mut rest): (Vec<Ticket>, Vec<Ticket>) = self
            .tickets()
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .partition(|t| t.status == destination);

        let mut moved = self.require(id)?.clone();
        moved.status = destination;
        moved.updated_at = now;
        bucket.insert(index, moved);
        renumber(&mut bucket);

        rest.extend(bucket.iter().cloned());
        self.replace_all(rest);

        Ok(Some(BoardWrite::UpsertMany(bucket)))
    }
}

/// Reassign positions `1000, 2000, ...` in slice order.
pub fn renumber(bucket: &mut [Ticket]) {
    for (i, ticket) in bucket.iter_mut().enumerate() {
        let rank = Position::try_from(i + 1).unwrap_or(Position::MAX);
        ticket.position = rank.saturating_mul(POSITION_STEP);
    }
}
