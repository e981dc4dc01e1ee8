//! The admin board: status buckets, ordering, and write-through persistence.

mod categorize;
mod engine;
mod locks;
mod reorder;
mod store;
mod sync;

pub use categorize::{categorize, classify, CategorizedTickets, DueCategory, DUE_SOON_WINDOW_DAYS};
pub use engine::{BoardColumns, RemoteMerge, TicketBoard, POSITION_STEP};
pub use locks::{BucketGuard, BucketLocks};
pub use reorder::{renumber, ReorderCommand};
pub use store::{BoardWrite, StoreError, TicketScope, TicketStore};
pub use sync::{
    BoardError, RetryPolicy, SyncOutcome, SyncState, SyncedBoard, DEFAULT_BACKOFF,
    DEFAULT_MAX_ATTEMPTS,
};
