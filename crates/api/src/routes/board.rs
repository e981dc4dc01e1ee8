//! Route definitions for the admin `/board`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::board;
use crate::state::AppState;

/// Routes mounted at `/board`. All require the admin role.
///
/// ```text
/// GET  /                      -> get_board
/// GET  /categories?now=       -> categories
/// POST /tickets/{id}/advance  -> advance
/// POST /tickets/{id}/reset    -> reset
/// PUT  /reorder               -> reorder
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(board::get_board))
        .route("/categories", get(board::categories))
        .route("/tickets/{id}/advance", post(board::advance))
        .route("/tickets/{id}/reset", post(board::reset))
        .route("/reorder", put(board::reorder))
}
