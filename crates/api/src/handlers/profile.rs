//! Handlers for the caller's `/profile`.
//!
//! The profile is the source of the submitter snapshot shown on tickets.

use axum::extract::State;
use axum::Json;
use songtailor_core::error::CoreError;
use songtailor_db::models::profile::{Profile, UpsertProfile};
use songtailor_db::repositories::ProfileRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Profile>>> {
    let profile = ProfileRepo::find(&state.pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: auth_user.user_id,
        }))?;
    Ok(Json(DataResponse { data: profile }))
}

/// PUT /api/v1/profile
///
/// Replaces both fields; blank strings are stored as `NULL`.
pub async fn put_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<UpsertProfile>,
) -> AppResult<Json<DataResponse<Profile>>> {
    let input = UpsertProfile {
        display_name: non_blank(input.display_name),
        avatar_url: non_blank(input.avatar_url),
    };
    let profile = ProfileRepo::upsert(&state.pool, auth_user.user_id, &input).await?;
    Ok(Json(DataResponse { data: profile }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
