#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use songtailor_api::auth::jwt::{generate_access_token, JwtConfig};
use songtailor_api::auth::password::hash_password;
use songtailor_api::config::ServerConfig;
use songtailor_api::router::build_app_router;
use songtailor_api::state::AppState;
use songtailor_api::ws::WsManager;
use songtailor_core::board::BucketLocks;
use songtailor_core::roles::{ROLE_ADMIN, ROLE_USER};
use songtailor_core::ticket::Ticket;
use songtailor_core::types::DbId;
use songtailor_db::models::ticket::CreateTicket;
use songtailor_db::models::user::{CreateUser, User};
use songtailor_db::repositories::{TicketRepo, UserRepo};
use songtailor_events::EventBus;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct horse battery";
pub const ADMIN_EMAIL: &str = "admin@test.com";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-not-for-production".to_string(),
            access_token_expiry_mins: 60,
        },
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        discord_webhook_url: None,
        sync_max_attempts: 1,
    }
}

/// Full router over `pool`, plus the event bus it publishes to.
pub fn build_test_app_with_bus(pool: PgPool) -> (Router, Arc<EventBus>) {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::clone(&event_bus),
        bucket_locks: Arc::new(BucketLocks::new()),
    };
    (build_app_router(state, &config), event_bus)
}

/// Full router over `pool` with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool).0
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] and return it with a valid token.
pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> (User, String) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            role: role.to_string(),
        },
    )
    .await
    .expect("user creation should succeed");
    let token = generate_access_token(user.id, &user.role, &test_config().jwt)
        .expect("token generation should succeed");
    (user, token)
}

pub async fn create_admin(pool: &PgPool) -> (User, String) {
    create_user(pool, ADMIN_EMAIL, ROLE_ADMIN).await
}

pub async fn create_client(pool: &PgPool, email: &str) -> (User, String) {
    create_user(pool, email, ROLE_USER).await
}

/// Insert a ticket directly; it lands at the end of the `new` bucket.
pub async fn insert_ticket(pool: &PgPool, user_id: DbId, title: &str) -> Ticket {
    let row = TicketRepo::create(
        pool,
        user_id,
        &CreateTicket {
            title: title.to_string(),
            deadline: None,
            genre: None,
            service_name: None,
            music_category: None,
            tracks: Vec::new(),
        },
    )
    .await
    .expect("ticket creation should succeed");
    Ticket::try_from(row).expect("fresh ticket should be valid")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");
    app.oneshot(request).await.expect("router should respond")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}
