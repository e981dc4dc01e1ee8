use std::sync::Arc;

use songtailor_core::board::{BucketLocks, RetryPolicy, DEFAULT_BACKOFF};
use songtailor_db::PgTicketStore;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: songtailor_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager.
    pub ws_manager: Arc<WsManager>,
    /// Ticket lifecycle events (notifier and realtime relay subscribe here).
    pub event_bus: Arc<songtailor_events::EventBus>,
    /// Serializes board writes per status bucket.
    pub bucket_locks: Arc<BucketLocks>,
}

impl AppState {
    /// Board persistence over this state's pool.
    pub fn ticket_store(&self) -> Arc<PgTicketStore> {
        Arc::new(PgTicketStore::new(self.pool.clone()))
    }

    /// Retry policy for board writes.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.sync_max_attempts, DEFAULT_BACKOFF)
    }
}
