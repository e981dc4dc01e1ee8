//! Handlers for the `/tickets` resource.
//!
//! Owners manage their own submissions; admins may act on any ticket.
//! Another user's ticket is reported as missing, not forbidden.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use songtailor_core::board::TicketScope;
use songtailor_core::error::CoreError;
use songtailor_core::status::TicketStatus;
use songtailor_core::ticket::Ticket;
use songtailor_core::types::DbId;
use songtailor_db::models::ticket::{into_tickets, CreateTicket, UpdateTicket};
use songtailor_db::repositories::TicketRepo;
use songtailor_events::DomainEvent;

use super::board::{fetch_ticket, lock_and_load, publish_outcome};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, TicketView};
use crate::state::AppState;

/// Longest accepted ticket title, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// GET /api/v1/tickets
///
/// The caller's own tickets, by position.
pub async fn list_tickets(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<TicketView>>>> {
    let rows = TicketRepo::list(&state.pool, TicketScope::Owner(auth_user.user_id)).await?;
    let tickets = into_tickets(rows)?;
    Ok(Json(DataResponse {
        data: tickets.into_iter().map(TicketView::from).collect(),
    }))
}

/// POST /api/v1/tickets
///
/// New tickets enter the initial bucket at its end and are announced on the
/// event bus.
pub async fn create_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(mut input): Json<CreateTicket>,
) -> AppResult<(StatusCode, Json<DataResponse<TicketView>>)> {
    input.title = validate_title(&input.title)?;

    let row = {
        let _guard = state.bucket_locks.acquire(&[TicketStatus::INITIAL]).await;
        TicketRepo::create(&state.pool, auth_user.user_id, &input).await?
    };
    let ticket = Ticket::try_from(row)?;

    state.event_bus.publish(DomainEvent::ticket_created(&ticket));
    tracing::info!(ticket_id = ticket.id, user_id = auth_user.user_id, "Ticket created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TicketView::from(ticket),
        }),
    ))
}

/// GET /api/v1/tickets/{id}
pub async fn get_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TicketView>>> {
    let ticket = fetch_ticket(&state, id).await?;
    auth_user.ensure_access(ticket.user_id, id)?;
    Ok(Json(DataResponse {
        data: TicketView::from(ticket),
    }))
}

/// PATCH /api/v1/tickets/{id}
///
/// Edits descriptive fields only; placement belongs to the board.
pub async fn update_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateTicket>,
) -> AppResult<Json<DataResponse<TicketView>>> {
    let ticket = fetch_ticket(&state, id).await?;
    auth_user.ensure_access(ticket.user_id, id)?;

    if let Some(title) = &input.title {
        input.title = Some(validate_title(title)?);
    }
    let patch = input.into_patch(Utc::now());

    // Serialize with placement writes to the same column.
    let _guard = state.bucket_locks.acquire(&[ticket.status]).await;
    let row = TicketRepo::update_details(&state.pool, id, &patch)
        .await?
        .ok_or(AppError::Core(CoreError::ticket_not_found(id)))?;
    let updated = Ticket::try_from(row)?;

    state
        .event_bus
        .publish(DomainEvent::ticket_updated(id, &patch).with_actor(auth_user.user_id));
    tracing::info!(ticket_id = id, user_id = auth_user.user_id, "Ticket details updated");

    Ok(Json(DataResponse {
        data: TicketView::from(updated),
    }))
}

/// DELETE /api/v1/tickets/{id}
///
/// Hard delete through the board so it serializes with placement changes.
pub async fn delete_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let ticket = fetch_ticket(&state, id).await?;
    auth_user.ensure_access(ticket.user_id, id)?;

    let (_guard, mut board) = lock_and_load(&state, &ticket, &[]).await?;
    let outcome = board.delete(id).await?;
    publish_outcome(&state, &outcome, auth_user.user_id);
    tracing::info!(ticket_id = id, user_id = auth_user.user_id, "Ticket deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn validate_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Title must not be empty".into(),
        )));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        ))));
    }
    Ok(title.to_string())
}
