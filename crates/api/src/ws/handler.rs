use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use songtailor_core::error::CoreError;
use songtailor_core::types::DbId;
use songtailor_db::repositories::TicketRepo;

use super::messages::{ClientMessage, ServerMessage};
use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::query::WsAuthParams;
use crate::state::AppState;

/// HTTP handler that authenticates `?token=` and upgrades to WebSocket.
///
/// The token is checked before the upgrade so bad credentials get a plain
/// 401 instead of an open socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let token = params.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;
    let user: AuthUser = validate_token(&token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?
        .into();

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Registers with `WsManager`, spawns a sender task fed by the manager
/// channel, then processes inbound frames until the client goes away.
async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket connected");

    let ws_manager = state.ws_manager.clone();
    let mut rx = ws_manager
        .add(conn_id.clone(), user.user_id, user.is_admin())
        .await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(msg) => dispatch(&state, &conn_id, &user, msg).await,
                    Err(e) => ServerMessage::Error {
                        message: format!("Unrecognised message: {e}"),
                    },
                };
                ws_manager.send_to(&conn_id, reply.to_frame()).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

async fn dispatch(
    state: &AppState,
    conn_id: &str,
    user: &AuthUser,
    msg: ClientMessage,
) -> ServerMessage {
    match msg {
        ClientMessage::Watch { ticket_id } => match check_watch(state, user, ticket_id).await {
            Ok(()) => {
                state.ws_manager.watch(conn_id, ticket_id).await;
                tracing::debug!(conn_id, ticket_id, "Watching ticket");
                ServerMessage::Watching { ticket_id }
            }
            Err(message) => ServerMessage::Error { message },
        },
        ClientMessage::Unwatch => {
            state.ws_manager.unwatch(conn_id).await;
            ServerMessage::Unwatched
        }
    }
}

/// Owners may watch their own tickets; admins may watch any.
async fn check_watch(state: &AppState, user: &AuthUser, ticket_id: DbId) -> Result<(), String> {
    let row = TicketRepo::find_by_id(&state.pool, ticket_id)
        .await
        .map_err(|e| {
            tracing::warn!(ticket_id, error = %e, "Watch lookup failed");
            "Ticket lookup failed".to_string()
        })?;
    match row {
        Some(row) if user.can_access(row.user_id) => Ok(()),
        _ => Err(format!("Ticket {ticket_id} not found")),
    }
}
