//! Ticket row model and DTOs.

use serde::Deserialize;
use songtailor_core::error::CoreError;
use songtailor_core::status::TicketStatus;
use songtailor_core::ticket::{parse_deadline, ProfileSnapshot, Ticket, TicketPatch, TrackRef};
use songtailor_core::types::{DbId, Position, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A `tickets` row left-joined with the submitter's profile.
///
/// `status` is kept as raw text here; conversion into [`Ticket`] is where
/// legacy spellings are normalized and unknown values rejected.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: DbId,
    pub title: String,
    pub status: String,
    pub position: Position,
    pub deadline: Option<Timestamp>,
    pub genre: Option<String>,
    pub service_name: Option<String>,
    pub music_category: Option<String>,
    pub tracks: Json<Vec<TrackRef>>,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub has_profile: bool,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = CoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status: TicketStatus = row.status.parse().map_err(|_| {
            CoreError::DataIntegrity(format!(
                "Ticket {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        let profiles = row.has_profile.then(|| ProfileSnapshot {
            display_name: row.display_name,
            avatar_url: row.avatar_url,
        });
        Ok(Ticket {
            id: row.id,
            title: row.title,
            status,
            position: row.position,
            deadline: row.deadline,
            created_at: row.created_at,
            updated_at: row.updated_at.unwrap_or(row.created_at),
            genre: row.genre,
            service_name: row.service_name,
            music_category: row.music_category,
            tracks: row.tracks.0,
            user_id: row.user_id,
            profiles,
        })
    }
}

/// Convert a batch of rows, failing on the first integrity violation.
pub fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, CoreError> {
    rows.into_iter().map(Ticket::try_from).collect()
}

/// DTO for submitting a new ticket.
///
/// `deadline` is taken as text and parsed leniently; anything unparseable
/// becomes "no deadline".
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    pub title: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub music_category: Option<String>,
    #[serde(default)]
    pub tracks: Vec<TrackRef>,
}

impl CreateTicket {
    pub fn parsed_deadline(&self) -> Option<Timestamp> {
        parse_deadline(self.deadline.as_deref())
    }
}

/// DTO for editing a ticket's descriptive fields.
///
/// Board placement (`status`, `position`) is not editable through this DTO.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicket {
    pub title: Option<String>,
    /// Absent leaves the deadline alone; `null` or unparseable text clears it.
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub service_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub music_category: Option<Option<String>>,
    pub tracks: Option<Vec<TrackRef>>,
}

impl UpdateTicket {
    /// The equivalent patch, stamped with `now`.
    pub fn into_patch(self, now: Timestamp) -> TicketPatch {
        TicketPatch {
            title: self.title,
            deadline: self
                .deadline
                .map(|raw| parse_deadline(raw.as_deref())),
            genre: self.genre,
            service_name: self.service_name,
            music_category: self.music_category,
            tracks: self.tracks,
            updated_at: Some(now),
            ..TicketPatch::default()
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn row(status: &str) -> TicketRow {
        TicketRow {
            id: 4,
            title: "Wedding mashup".into(),
            status: status.into(),
            position: 3000,
            deadline: None,
            genre: None,
            service_name: None,
            music_category: None,
            tracks: Json(Vec::new()),
            user_id: 2,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            updated_at: None,
            has_profile: false,
            display_name: None,
            avatar_url: None,
        }
    }

    #[test]
    fn legacy_status_is_normalized() {
        let ticket = Ticket::try_from(row("in progress")).unwrap();
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.updated_at, ticket.created_at);
        assert!(ticket.profiles.is_none());
    }

    #[test]
    fn unknown_status_is_integrity_error() {
        assert_matches!(
            Ticket::try_from(row("archived")),
            Err(CoreError::DataIntegrity(msg)) if msg.contains("Ticket 4")
        );
    }

    #[test]
    fn joined_profile_becomes_snapshot() {
        let mut r = row("new");
        r.has_profile = true;
        r.display_name = Some("Mika".into());
        let ticket = Ticket::try_from(r).unwrap();
        assert_eq!(
            ticket.profiles.and_then(|p| p.display_name).as_deref(),
            Some("Mika")
        );
    }

    #[test]
    fn update_dto_distinguishes_null_from_absent() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let dto: UpdateTicket =
            serde_json::from_str(r#"{"deadline": null, "title": "New title"}"#).unwrap();
        let patch = dto.into_patch(now);
        assert_eq!(patch.deadline, Some(None));
        assert_eq!(patch.genre, None);
        assert_eq!(patch.status, None);
        assert_eq!(patch.updated_at, Some(now));
    }

    #[test]
    fn update_dto_parses_deadline_leniently() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let dto: UpdateTicket = serde_json::from_str(r#"{"deadline": "2026-04-01"}"#).unwrap();
        assert_eq!(
            dto.into_patch(now).deadline,
            Some(Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()))
        );
    }
}
