//! Display profile model and DTOs.

use serde::{Deserialize, Serialize};
use songtailor_core::ticket::ProfileSnapshot;
use songtailor_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `profiles` table. One per user at most.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub user_id: DbId,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: Timestamp,
}

impl Profile {
    /// The read-only copy attached to tickets.
    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// DTO for creating or replacing a profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertProfile {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}
