//! Write-through board: optimistic apply, persist, roll back on failure.
//!
//! [`SyncedBoard`] wraps a [`TicketBoard`] and a [`TicketStore`]. Each
//! operation snapshots the board, applies the change locally, marks the
//! touched tickets pending, and then issues the write. A write that still
//! fails after [`RetryPolicy::max_attempts`] restores the snapshot, marks
//! the tickets failed, and surfaces [`BoardError::Persistence`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CoreError;
use crate::ticket::TicketPatch;
use crate::types::{DbId, Timestamp};

use super::engine::{RemoteMerge, TicketBoard};
use super::reorder::ReorderCommand;
use super::store::{BoardWrite, StoreError, TicketScope, TicketStore};

/// Default number of write attempts before rolling back.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt; doubles for each later one.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The write never succeeded; local state has been rolled back.
    #[error("Persistence failed after {attempts} attempt(s): {message}")]
    Persistence { attempts: u32, message: String },
}

impl BoardError {
    /// Lift a store error, keeping domain errors (e.g. a row with an
    /// unknown status) as [`BoardError::Core`].
    fn from_store(err: StoreError, attempts: u32) -> Self {
        match err.downcast::<CoreError>() {
            Ok(core) => BoardError::Core(*core),
            Err(other) => BoardError::Persistence {
                attempts,
                message: other.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Sync bookkeeping
// ---------------------------------------------------------------------------

/// Per-ticket synchronisation state. Absent means "in sync".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// A write covering this ticket is in flight.
    Pending,
    /// The last write covering this ticket failed and was rolled back.
    Failed { attempts: u32, error: String },
}

/// How hard to try before giving up on a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt.saturating_sub(2))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

/// What a synced operation did.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Nothing changed and nothing was written.
    Unchanged,
    /// The change was applied and persisted with this write.
    Persisted(BoardWrite),
}

impl SyncOutcome {
    pub fn write(&self) -> Option<&BoardWrite> {
        match self {
            SyncOutcome::Unchanged => None,
            SyncOutcome::Persisted(write) => Some(write),
        }
    }
}

// ---------------------------------------------------------------------------
// SyncedBoard
// ---------------------------------------------------------------------------

/// A [`TicketBoard`] kept in step with a [`TicketStore`].
pub struct SyncedBoard<S: ?Sized> {
    board: TicketBoard,
    store: Arc<S>,
    retry: RetryPolicy,
    sync: HashMap<DbId, SyncState>,
}

impl<S> SyncedBoard<S>
where
    S: TicketStore + ?Sized,
{
    pub fn new(store: Arc<S>, board: TicketBoard) -> Self {
        Self {
            board,
            store,
            retry: RetryPolicy::default(),
            sync: HashMap::new(),
        }
    }

    /// Fetch every ticket in `scope` and build a board from them.
    pub async fn load(store: Arc<S>, scope: TicketScope) -> Result<Self, BoardError> {
        let tickets = store
            .fetch_all(scope)
            .await
            .map_err(|e| BoardError::from_store(e, 1))?;
        Ok(Self::new(store, TicketBoard::new(tickets)))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn board(&self) -> &TicketBoard {
        &self.board
    }

    pub fn sync_state(&self, id: DbId) -> Option<&SyncState> {
        self.sync.get(&id)
    }

    /// Ids whose last write failed and was rolled back.
    pub fn failed_ids(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = self
            .sync
            .iter()
            .filter(|(_, state)| matches!(state, SyncState::Failed { .. }))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub async fn advance(&mut self, id: DbId, now: Timestamp) -> Result<SyncOutcome, BoardError> {
        self.run(|board| board.advance(id, now)).await
    }

    pub async fn reset(&mut self, id: DbId, now: Timestamp) -> Result<SyncOutcome, BoardError> {
        self.run(|board| board.reset(id, now)).await
    }

    pub async fn reorder(
        &mut self,
        command: &ReorderCommand,
        now: Timestamp,
    ) -> Result<SyncOutcome, BoardError> {
        self.run(|board| board.reorder(command, now)).await
    }

    pub async fn delete(&mut self, id: DbId) -> Result<SyncOutcome, BoardError> {
        self.run(|board| board.remove(id).map(Some)).await
    }

    /// Merge a realtime update. Purely local; nothing is written back.
    pub fn apply_remote(&mut self, id: DbId, patch: &TicketPatch) -> RemoteMerge {
        self.board.apply_remote(id, patch)
    }

    async fn run<F>(&mut self, op: F) -> Result<SyncOutcome, BoardError>
    where
        F: FnOnce(&mut TicketBoard) -> Result<Option<BoardWrite>, CoreError>,
    {
        let snapshot = self.board.clone();
        let Some(write) = op(&mut self.board)? else {
            return Ok(SyncOutcome::Unchanged);
        };
        self.commit(snapshot, write).await
    }

    async fn commit(
        &mut self,
        snapshot: TicketBoard,
        write: BoardWrite,
    ) -> Result<SyncOutcome, BoardError> {
        let ids = write.ticket_ids();
        for id in &ids {
            self.sync.insert(*id, SyncState::Pending);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match write.apply(self.store.as_ref()).await {
                Ok(()) => {
                    for id in &ids {
                        self.sync.remove(id);
                    }
                    return Ok(SyncOutcome::Persisted(write));
                }
                // Domain errors (missing row, bad status) will not heal on retry.
                Err(err) if attempt < self.retry.max_attempts && !err.is::<CoreError>() => {
                    drop(err);
                    tokio::time::sleep(self.retry.delay_before(attempt + 1)).await;
                }
                Err(err) => {
                    self.board = snapshot;
                    let error = BoardError::from_store(err, attempt);
                    for id in &ids {
                        self.sync.insert(
                            *id,
                            SyncState::Failed {
                                attempts: attempt,
                                error: error.to_string(),
                            },
                        );
                    }
                    return Err(error);
                }
            }
        }
    }
}
