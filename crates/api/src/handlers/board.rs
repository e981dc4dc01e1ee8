//! Admin board handlers: columns, deadline categories, and the three
//! placement operations (advance, reset, reorder).
//!
//! Every placement change runs under the locks of the buckets it touches,
//! from loading the board until the write lands.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use songtailor_core::board::{
    categorize, BoardColumns, BoardWrite, BucketGuard, CategorizedTickets, ReorderCommand,
    SyncOutcome, SyncedBoard, TicketBoard, TicketScope,
};
use songtailor_core::error::CoreError;
use songtailor_core::status::TicketStatus;
use songtailor_core::ticket::Ticket;
use songtailor_core::types::DbId;
use songtailor_db::models::ticket::into_tickets;
use songtailor_db::repositories::TicketRepo;
use songtailor_db::PgTicketStore;
use songtailor_events::DomainEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::ReferenceTimeParams;
use crate::response::{DataResponse, TicketView};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Read views
// ---------------------------------------------------------------------------

/// GET /api/v1/board
///
/// Every ticket grouped by status, each column in position order.
pub async fn get_board(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<BoardColumns>>> {
    let board = load_board(&state).await?;
    Ok(Json(DataResponse {
        data: board.columns(),
    }))
}

/// GET /api/v1/board/categories?now=
pub async fn categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ReferenceTimeParams>,
) -> AppResult<Json<DataResponse<CategorizedTickets>>> {
    let now = params.resolve()?;
    let board = load_board(&state).await?;
    Ok(Json(DataResponse {
        data: categorize(board.tickets(), now),
    }))
}

// ---------------------------------------------------------------------------
// Placement operations
// ---------------------------------------------------------------------------

/// POST /api/v1/board/tickets/{id}/advance
///
/// One step forward; a `done` ticket is returned unchanged.
pub async fn advance(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TicketView>>> {
    let ticket = fetch_ticket(&state, id).await?;
    let destinations: Vec<TicketStatus> = ticket.status.next().into_iter().collect();
    let (_guard, mut board) = lock_and_load(&state, &ticket, &destinations).await?;

    let outcome = board.advance(id, Utc::now()).await?;
    publish_outcome(&state, &outcome, admin.user_id);
    tracing::info!(
        ticket_id = id,
        from = %ticket.status,
        changed = outcome.write().is_some(),
        "Ticket advanced"
    );

    held_ticket(board.board(), id)
}

/// POST /api/v1/board/tickets/{id}/reset
pub async fn reset(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TicketView>>> {
    let ticket = fetch_ticket(&state, id).await?;
    let (_guard, mut board) = lock_and_load(&state, &ticket, &[TicketStatus::INITIAL]).await?;

    let outcome = board.reset(id, Utc::now()).await?;
    publish_outcome(&state, &outcome, admin.user_id);
    tracing::info!(
        ticket_id = id,
        from = %ticket.status,
        changed = outcome.write().is_some(),
        "Ticket reset"
    );

    held_ticket(board.board(), id)
}

/// PUT /api/v1/board/reorder
///
/// Returns the destination column after the move.
pub async fn reorder(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(command): Json<ReorderCommand>,
) -> AppResult<Json<DataResponse<Vec<TicketView>>>> {
    let ticket = fetch_ticket(&state, command.ticket_id).await?;
    let (_guard, mut board) =
        lock_and_load(&state, &ticket, &[command.destination_status]).await?;

    let outcome = board.reorder(&command, Utc::now()).await?;
    publish_outcome(&state, &outcome, admin.user_id);
    tracing::info!(
        ticket_id = command.ticket_id,
        to = %command.destination_status,
        index = command.destination_index,
        changed = outcome.write().is_some(),
        "Ticket reordered"
    );

    let column = board
        .board()
        .bucket(command.destination_status)
        .cloned()
        .map(TicketView::from)
        .collect();
    Ok(Json(DataResponse { data: column }))
}

// ---------------------------------------------------------------------------
// Shared helpers (also used by ticket deletion)
// ---------------------------------------------------------------------------

/// Load one ticket or fail with 404.
pub(crate) async fn fetch_ticket(state: &AppState, id: DbId) -> AppResult<Ticket> {
    let row = TicketRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::ticket_not_found(id)))?;
    Ok(Ticket::try_from(row)?)
}

/// Lock the ticket's current bucket plus `destinations`, then load the
/// board under those locks.
///
/// The ticket's status was read before locking; if another writer moved it
/// in between, the locks taken are the wrong ones and the request is refused
/// with 409.
pub(crate) async fn lock_and_load<'s>(
    state: &'s AppState,
    ticket: &Ticket,
    destinations: &[TicketStatus],
) -> AppResult<(BucketGuard<'s>, SyncedBoard<PgTicketStore>)> {
    let mut buckets = Vec::with_capacity(destinations.len() + 1);
    buckets.push(ticket.status);
    buckets.extend_from_slice(destinations);
    let guard = state.bucket_locks.acquire(&buckets).await;

    let board = SyncedBoard::load(state.ticket_store(), TicketScope::All)
        .await?
        .with_retry(state.retry_policy());

    match board.board().get(ticket.id) {
        Some(held) if held.status == ticket.status => Ok((guard, board)),
        Some(held) => Err(AppError::Core(CoreError::Conflict(format!(
            "Ticket {} moved to '{}' while the change was being prepared",
            ticket.id, held.status
        )))),
        None => Err(AppError::Core(CoreError::ticket_not_found(ticket.id))),
    }
}

/// Announce a persisted board write on the event bus.
pub(crate) fn publish_outcome(state: &AppState, outcome: &SyncOutcome, actor: DbId) {
    let Some(write) = outcome.write() else {
        return;
    };
    match write {
        BoardWrite::Update { id, patch } => {
            state
                .event_bus
                .publish(DomainEvent::ticket_updated(*id, patch).with_actor(actor));
        }
        BoardWrite::UpsertMany(tickets) => {
            for ticket in tickets {
                state.event_bus.publish(
                    DomainEvent::ticket_updated(ticket.id, &ticket.placement_patch())
                        .with_actor(actor),
                );
            }
        }
        BoardWrite::Delete(id) => {
            state
                .event_bus
                .publish(DomainEvent::ticket_deleted(*id).with_actor(actor));
        }
    }
}

async fn load_board(state: &AppState) -> AppResult<TicketBoard> {
    let rows = TicketRepo::list(&state.pool, TicketScope::All).await?;
    Ok(TicketBoard::new(into_tickets(rows)?))
}

fn held_ticket(board: &TicketBoard, id: DbId) -> AppResult<Json<DataResponse<TicketView>>> {
    let ticket = board
        .get(id)
        .cloned()
        .ok_or(AppError::Core(CoreError::ticket_not_found(id)))?;
    Ok(Json(DataResponse {
        data: TicketView::from(ticket),
    }))
}
