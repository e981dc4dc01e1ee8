//! Repository for the `tickets` table.
//!
//! Reads always join the submitter's profile so callers get a complete
//! [`TicketRow`]. Writes use canonical status spellings only.

use songtailor_core::board::{TicketScope, POSITION_STEP};
use songtailor_core::status::TicketStatus;
use songtailor_core::ticket::{Ticket, TicketPatch};
use songtailor_core::types::{DbId, Position, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::ticket::{CreateTicket, TicketRow};

/// Select list for a ticket aliased `t` joined with its profile aliased `p`.
const JOINED_COLUMNS: &str = "t.id, t.title, t.status, t.position, t.deadline, t.genre, \
     t.service_name, t.music_category, t.tracks, t.user_id, t.created_at, t.updated_at, \
     (p.user_id IS NOT NULL) AS has_profile, p.display_name, p.avatar_url";

const PROFILE_JOIN: &str = "LEFT JOIN profiles p ON p.user_id = t.user_id";

/// Provides CRUD operations for tickets.
pub struct TicketRepo;

impl TicketRepo {
    /// Every ticket in `scope`, by position ascending.
    pub async fn list(pool: &PgPool, scope: TicketScope) -> Result<Vec<TicketRow>, sqlx::Error> {
        let owner = match scope {
            TicketScope::All => None,
            TicketScope::Owner(user_id) => Some(user_id),
        };
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM tickets t {PROFILE_JOIN} \
             WHERE ($1::BIGINT IS NULL OR t.user_id = $1) \
             ORDER BY t.position ASC, t.id ASC"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(owner)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!("SELECT {JOINED_COLUMNS} FROM tickets t {PROFILE_JOIN} WHERE t.id = $1");
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new ticket at the end of the initial bucket.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateTicket,
    ) -> Result<TicketRow, sqlx::Error> {
        let query = format!(
            "WITH t AS ( \
                INSERT INTO tickets (title, status, position, deadline, genre, service_name, \
                                     music_category, tracks, user_id, updated_at) \
                VALUES ($1, $2, \
                        COALESCE((SELECT MAX(position) FROM tickets WHERE status = $2), 0) + $3, \
                        $4, $5, $6, $7, $8, $9, NOW()) \
                RETURNING * \
             ) \
             SELECT {JOINED_COLUMNS} FROM t {PROFILE_JOIN}"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(&input.title)
            .bind(TicketStatus::INITIAL.as_str())
            .bind(POSITION_STEP)
            .bind(input.parsed_deadline())
            .bind(&input.genre)
            .bind(&input.service_name)
            .bind(&input.music_category)
            .bind(Json(&input.tracks))
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Apply the present fields of `patch`.
    ///
    /// Nullable columns use a presence flag so `Some(None)` clears them while
    /// `None` leaves them untouched. Returns `false` when no row matched.
    pub async fn update_fields(
        pool: &PgPool,
        id: DbId,
        patch: &TicketPatch,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tickets SET \
                title = COALESCE($2, title), \
                status = COALESCE($3, status), \
                position = COALESCE($4, position), \
                deadline = CASE WHEN $5 THEN $6 ELSE deadline END, \
                genre = CASE WHEN $7 THEN $8 ELSE genre END, \
                service_name = CASE WHEN $9 THEN $10 ELSE service_name END, \
                music_category = CASE WHEN $11 THEN $12 ELSE music_category END, \
                tracks = COALESCE($13, tracks), \
                updated_at = COALESCE($14, NOW()) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&patch.title)
        .bind(patch.status.map(TicketStatus::as_str))
        .bind(patch.position)
        .bind(patch.deadline.is_some())
        .bind(patch.deadline.flatten())
        .bind(patch.genre.is_some())
        .bind(patch.genre.clone().flatten())
        .bind(patch.service_name.is_some())
        .bind(patch.service_name.clone().flatten())
        .bind(patch.music_category.is_some())
        .bind(patch.music_category.clone().flatten())
        .bind(patch.tracks.as_ref().map(Json))
        .bind(patch.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a descriptive-field patch and return the refreshed row.
    ///
    /// Placement fields in `patch` are ignored; the board owns those.
    pub async fn update_details(
        pool: &PgPool,
        id: DbId,
        patch: &TicketPatch,
    ) -> Result<Option<TicketRow>, sqlx::Error> {
        let details = TicketPatch {
            status: None,
            position: None,
            ..patch.clone()
        };
        if !Self::update_fields(pool, id, &details).await? {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Insert-or-update every ticket in one statement.
    ///
    /// Existing rows only take the placement columns, so descriptive fields
    /// edited since the batch was read survive. Every column is written on
    /// insert.
    pub async fn upsert_many(pool: &PgPool, tickets: &[Ticket]) -> Result<u64, sqlx::Error> {
        if tickets.is_empty() {
            return Ok(0);
        }

        let mut ids: Vec<DbId> = Vec::with_capacity(tickets.len());
        let mut titles: Vec<String> = Vec::with_capacity(tickets.len());
        let mut statuses: Vec<String> = Vec::with_capacity(tickets.len());
        let mut positions: Vec<Position> = Vec::with_capacity(tickets.len());
        let mut deadlines: Vec<Option<Timestamp>> = Vec::with_capacity(tickets.len());
        let mut genres: Vec<Option<String>> = Vec::with_capacity(tickets.len());
        let mut service_names: Vec<Option<String>> = Vec::with_capacity(tickets.len());
        let mut categories: Vec<Option<String>> = Vec::with_capacity(tickets.len());
        let mut tracks: Vec<Json<_>> = Vec::with_capacity(tickets.len());
        let mut user_ids: Vec<DbId> = Vec::with_capacity(tickets.len());
        let mut created: Vec<Timestamp> = Vec::with_capacity(tickets.len());
        let mut updated: Vec<Timestamp> = Vec::with_capacity(tickets.len());

        for t in tickets {
            ids.push(t.id);
            titles.push(t.title.clone());
            statuses.push(t.status.as_str().to_string());
            positions.push(t.position);
            deadlines.push(t.deadline);
            genres.push(t.genre.clone());
            service_names.push(t.service_name.clone());
            categories.push(t.music_category.clone());
            tracks.push(Json(t.tracks.clone()));
            user_ids.push(t.user_id);
            created.push(t.created_at);
            updated.push(t.updated_at);
        }

        let result = sqlx::query(
            "INSERT INTO tickets (id, title, status, position, deadline, genre, service_name, \
                                  music_category, tracks, user_id, created_at, updated_at) \
             SELECT * FROM UNNEST( \
                $1::BIGINT[], $2::TEXT[], $3::TEXT[], $4::INTEGER[], $5::TIMESTAMPTZ[], \
                $6::TEXT[], $7::TEXT[], $8::TEXT[], $9::JSONB[], $10::BIGINT[], \
                $11::TIMESTAMPTZ[], $12::TIMESTAMPTZ[]) \
             ON CONFLICT (id) DO UPDATE SET \
                status = EXCLUDED.status, \
                position = EXCLUDED.position, \
                updated_at = GREATEST(tickets.updated_at, EXCLUDED.updated_at)",
        )
        .bind(ids)
        .bind(titles)
        .bind(statuses)
        .bind(positions)
        .bind(deadlines)
        .bind(genres)
        .bind(service_names)
        .bind(categories)
        .bind(tracks)
        .bind(user_ids)
        .bind(created)
        .bind(updated)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete a ticket. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
