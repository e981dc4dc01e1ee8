//! The in-memory ticket board.
//!
//! [`TicketBoard`] is an owned state container. Every mutating method is a
//! reducer: it validates first, then changes the collection, and returns the
//! [`BoardWrite`] that brings persistence in line (or `None` for a no-op).
//! Nothing here performs I/O; see [`super::sync`] for write-through.

use serde::Serialize;

use crate::error::CoreError;
use crate::status::TicketStatus;
use crate::ticket::{Ticket, TicketPatch};
use crate::types::{DbId, Position, Timestamp};

use super::reorder::ReorderCommand;
use super::store::BoardWrite;

/// Gap between consecutive positions after a renumber.
pub const POSITION_STEP: Position = 1000;

/// Result of merging a realtime update into the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMerge {
    /// The patch was merged.
    Applied,
    /// The patch is older than the copy already held and was dropped.
    Stale,
    /// No ticket with that id is on the board.
    Unknown,
}

/// Tickets grouped into board columns, each in display order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardColumns {
    pub new: Vec<Ticket>,
    pub accepted: Vec<Ticket>,
    pub in_progress: Vec<Ticket>,
    pub done: Vec<Ticket>,
}

impl BoardColumns {
    fn column_mut(&mut self, status: TicketStatus) -> &mut Vec<Ticket> {
        match status {
            TicketStatus::New => &mut self.new,
            TicketStatus::Accepted => &mut self.accepted,
            TicketStatus::InProgress => &mut self.in_progress,
            TicketStatus::Done => &mut self.done,
        }
    }
}

/// Ordered collection of tickets across all status buckets.
///
/// Invariant: `tickets` is sorted by status column, then position, then id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketBoard {
    tickets: Vec<Ticket>,
}

impl TicketBoard {
    pub fn new(mut tickets: Vec<Ticket>) -> Self {
        sort_board(&mut tickets);
        Self { tickets }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn into_tickets(self) -> Vec<Ticket> {
        self.tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn get(&self, id: DbId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    /// Tickets of one status in display order.
    pub fn bucket(&self, status: TicketStatus) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter().filter(move |t| t.status == status)
    }

    /// Owned copy of the board split into its four columns.
    pub fn columns(&self) -> BoardColumns {
        let mut columns = BoardColumns::default();
        for ticket in &self.tickets {
            columns.column_mut(ticket.status).push(ticket.clone());
        }
        columns
    }

    /// Index of a ticket among the members of its own bucket.
    pub fn index_in_bucket(&self, id: DbId) -> Option<usize> {
        let status = self.get(id)?.status;
        self.bucket(status).position(|t| t.id == id)
    }

    /// Position that places a ticket after every current member of `status`,
    /// or `None` when the highest position leaves no room for another step.
    pub fn end_of_bucket(&self, status: TicketStatus) -> Option<Position> {
        match self.bucket(status).map(|t| t.position).max() {
            None => Some(POSITION_STEP),
            Some(max) => max.checked_add(POSITION_STEP),
        }
    }

    /// Add a ticket, replacing any existing ticket with the same id.
    pub fn insert(&mut self, ticket: Ticket) {
        self.tickets.retain(|t| t.id != ticket.id);
        self.tickets.push(ticket);
        sort_board(&mut self.tickets);
    }

    /// Move a ticket one step forward through the lifecycle.
    ///
    /// The ticket lands at the end of its new bucket. Returns `Ok(None)`
    /// without touching anything when the ticket is already terminal.
    pub fn advance(&mut self, id: DbId, now: Timestamp) -> Result<Option<BoardWrite>, CoreError> {
        let current = self.require(id)?.status;
        match current.next() {
            Some(next) => self.move_to_end(id, next, now).map(Some),
            None => Ok(None),
        }
    }

    /// Send a ticket back to the initial status, bypassing the forward order.
    ///
    /// A ticket already in the initial status is left alone.
    pub fn reset(&mut self, id: DbId, now: Timestamp) -> Result<Option<BoardWrite>, CoreError> {
        let current = self.require(id)?.status;
        if current == TicketStatus::INITIAL {
            return Ok(None);
        }
        self.move_to_end(id, TicketStatus::INITIAL, now).map(Some)
    }

    /// Hard-delete a ticket from the board.
    pub fn remove(&mut self, id: DbId) -> Result<BoardWrite, CoreError> {
        self.require(id)?;
        self.tickets.retain(|t| t.id != id);
        Ok(BoardWrite::Delete(id))
    }

    /// Merge a partial update pushed from another writer.
    ///
    /// A patch stamped earlier than the held copy's `updated_at` is an echo
    /// of an older state and is dropped.
    pub fn apply_remote(&mut self, id: DbId, patch: &TicketPatch) -> RemoteMerge {
        let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == id) else {
            return RemoteMerge::Unknown;
        };
        if patch
            .updated_at
            .is_some_and(|stamped| stamped < ticket.updated_at)
        {
            return RemoteMerge::Stale;
        }
        ticket.apply_patch(patch);
        if patch.status.is_some() || patch.position.is_some() {
            sort_board(&mut self.tickets);
        }
        RemoteMerge::Applied
    }

    pub(super) fn require(&self, id: DbId) -> Result<&Ticket, CoreError> {
        self.get(id).ok_or_else(|| CoreError::ticket_not_found(id))
    }

    /// Replace the whole collection; callers are responsible for keeping
    /// positions distinct within each bucket.
    pub(super) fn replace_all(&mut self, tickets: Vec<Ticket>) {
        self.tickets = tickets;
        sort_board(&mut self.tickets);
    }

    /// Place a ticket from another bucket after every member of `status`.
    ///
    /// When the bucket's positions are exhausted the whole destination is
    /// renumbered and written back as one batch instead.
    fn move_to_end(
        &mut self,
        id: DbId,
        status: TicketStatus,
        now: Timestamp,
    ) -> Result<BoardWrite, CoreError> {
        let Some(position) = self.end_of_bucket(status) else {
            let command = ReorderCommand {
                ticket_id: id,
                source_status: None,
                destination_status: status,
                destination_index: usize::MAX,
            };
            return self.reorder(&command, now)?.ok_or_else(|| {
                CoreError::Internal(format!("Ticket {id} is already at the end of '{status}'"))
            });
        };

        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::ticket_not_found(id))?;
        ticket.status = status;
        ticket.position = position;
        ticket.updated_at = now;
        let patch = ticket.placement_patch();

        sort_board(&mut self.tickets);
        Ok(BoardWrite::Update { id, patch })
    }
}

/// Order first by status column, then by position; id breaks any tie left
/// by externally supplied data.
fn sort_board(tickets: &mut [Ticket]) {
    tickets.sort_by_key(|t| (t.status.ordinal(), t.position, t.id));
}
