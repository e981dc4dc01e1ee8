pub mod auth;
pub mod board;
pub mod health;
pub mod profile;
pub mod tickets;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws?token=                         WebSocket (ticket watches)
///
/// /auth/register, /auth/login        public
/// /auth/me                           authenticated
///
/// /tickets, /tickets/{id}            owner or admin
/// /profile                           authenticated
///
/// /board, /board/categories          admin
/// /board/tickets/{id}/advance|reset  admin
/// /board/reorder                     admin
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/tickets", tickets::router())
        .nest("/board", board::router())
        .nest("/profile", profile::router())
}
