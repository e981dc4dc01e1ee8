//! Route definitions for the `/tickets` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::tickets;
use crate::state::AppState;

/// Routes mounted at `/tickets`.
///
/// ```text
/// GET    /       -> list_tickets (own tickets)
/// POST   /       -> create_ticket
/// GET    /{id}   -> get_ticket    (owner or admin)
/// PATCH  /{id}   -> update_ticket (owner or admin)
/// DELETE /{id}   -> delete_ticket (owner or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route(
            "/{id}",
            get(tickets::get_ticket)
                .patch(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
}
