//! The ticket entity and its partial-update patch.
//!
//! A ticket is a client's request for a custom music edit. Only `status`
//! and `position` carry board behaviour; the classification tags and track
//! list are descriptive and travel through the engine untouched.

use std::sync::LazyLock;

use chrono::{NaiveDate, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::status::TicketStatus;
use crate::types::{DbId, Position, Timestamp};

/// Extracts the 11-character video id from the YouTube link shapes clients
/// paste (`watch?v=`, `youtu.be/`, `shorts/`, `embed/`).
const YOUTUBE_ID_PATTERN: &str =
    r"(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/)|youtu\.be/)([A-Za-z0-9_-]{11})";

static YOUTUBE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(YOUTUBE_ID_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A music-edit request tracked on the admin board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: DbId,
    pub title: String,
    pub status: TicketStatus,
    /// Orders the ticket within its status bucket only.
    pub position: Position,
    /// `None` routes the ticket to the backlog in categorized views.
    #[serde(default)]
    pub deadline: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub music_category: Option<String>,
    #[serde(default)]
    pub tracks: Vec<TrackRef>,
    pub user_id: DbId,
    /// Submitter display snapshot attached at fetch time. Read-only.
    #[serde(default)]
    pub profiles: Option<ProfileSnapshot>,
}

impl Ticket {
    /// A fresh ticket in the initial status with no descriptive fields.
    pub fn new(id: DbId, title: impl Into<String>, user_id: DbId, created_at: Timestamp) -> Self {
        Self {
            id,
            title: title.into(),
            status: TicketStatus::INITIAL,
            position: 0,
            deadline: None,
            created_at,
            updated_at: created_at,
            genre: None,
            service_name: None,
            music_category: None,
            tracks: Vec::new(),
            user_id,
            profiles: None,
        }
    }

    /// Merge the present fields of `patch` into this ticket.
    ///
    /// Fields absent from the patch are left untouched; `id`, `user_id`,
    /// `created_at` and `profiles` are never patched.
    pub fn apply_patch(&mut self, patch: &TicketPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(genre) = &patch.genre {
            self.genre.clone_from(genre);
        }
        if let Some(service_name) = &patch.service_name {
            self.service_name.clone_from(service_name);
        }
        if let Some(music_category) = &patch.music_category {
            self.music_category.clone_from(music_category);
        }
        if let Some(tracks) = &patch.tracks {
            self.tracks.clone_from(tracks);
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }

    /// The board-relevant fields as a patch: `status`, `position`, `updated_at`.
    pub fn placement_patch(&self) -> TicketPatch {
        TicketPatch {
            status: Some(self.status),
            position: Some(self.position),
            updated_at: Some(self.updated_at),
            ..TicketPatch::default()
        }
    }

    /// Thumbnail of the first track that has one.
    pub fn thumbnail_url(&self) -> Option<String> {
        self.tracks.iter().find_map(TrackRef::thumbnail_url)
    }
}

/// Denormalized submitter profile joined onto a ticket at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// TrackRef
// ---------------------------------------------------------------------------

/// A reference link to a source track with optional tempo metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub url: String,
    #[serde(default)]
    pub base_bpm: Option<f64>,
    #[serde(default)]
    pub target_bpm: Option<f64>,
}

impl TrackRef {
    /// Preview image for YouTube links; `None` for anything else.
    pub fn thumbnail_url(&self) -> Option<String> {
        YOUTUBE_ID_RE
            .captures(&self.url)
            .and_then(|caps| caps.get(1))
            .map(|id| format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id.as_str()))
    }

    /// Requested speed change as `target / base`, when both are positive.
    pub fn tempo_ratio(&self) -> Option<f64> {
        match (self.base_bpm, self.target_bpm) {
            (Some(base), Some(target)) if base > 0.0 && target > 0.0 => Some(target / base),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TicketPatch
// ---------------------------------------------------------------------------

/// Partial-field update for a single ticket.
///
/// Used both for local writes to persistence and for realtime updates
/// pushed from elsewhere. `deadline` is doubly optional: absent leaves the
/// deadline alone, `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<Option<Timestamp>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub genre: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_name: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub music_category: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Deserialize a present field (including `null`) as `Some(..)` so that
/// `#[serde(default)]` can represent absence as the outer `None`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Deadline parsing
// ---------------------------------------------------------------------------

/// Parse a submitted deadline leniently.
///
/// Accepts RFC 3339 instants and bare `YYYY-MM-DD` dates (midnight UTC).
/// Empty or malformed input means "no deadline" and is never an error.
pub fn parse_deadline(raw: Option<&str>) -> Option<Timestamp> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn ts(rfc3339: &str) -> Timestamp {
        chrono::DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn track(url: &str) -> TrackRef {
        TrackRef {
            url: url.to_string(),
            base_bpm: None,
            target_bpm: None,
        }
    }

    #[test]
    fn new_ticket_starts_in_initial_status() {
        let created = ts("2026-03-01T10:00:00Z");
        let ticket = Ticket::new(1, "Jazz medley", 7, created);
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.updated_at, created);
        assert!(ticket.deadline.is_none());
    }

    #[test]
    fn patch_touches_only_present_fields() {
        let created = ts("2026-03-01T10:00:00Z");
        let mut ticket = Ticket::new(1, "Jazz medley", 7, created);
        ticket.genre = Some("jazz".into());
        ticket.deadline = Some(created + Duration::days(3));

        let patch = TicketPatch {
            title: Some("Jazz medley v2".into()),
            ..TicketPatch::default()
        };
        ticket.apply_patch(&patch);

        assert_eq!(ticket.title, "Jazz medley v2");
        assert_eq!(ticket.genre.as_deref(), Some("jazz"));
        assert!(ticket.deadline.is_some());
        assert_eq!(ticket.status, TicketStatus::New);
    }

    #[test]
    fn patch_null_deadline_clears_it() {
        let mut ticket = Ticket::new(1, "t", 7, ts("2026-03-01T10:00:00Z"));
        ticket.deadline = Some(ts("2026-03-05T00:00:00Z"));

        let patch: TicketPatch = serde_json::from_str(r#"{"deadline": null}"#).unwrap();
        assert_eq!(patch.deadline, Some(None));
        ticket.apply_patch(&patch);
        assert!(ticket.deadline.is_none());

        let absent: TicketPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent, TicketPatch::default());
    }

    #[test]
    fn placement_patch_carries_board_fields() {
        let mut ticket = Ticket::new(3, "t", 7, ts("2026-03-01T10:00:00Z"));
        ticket.status = TicketStatus::Accepted;
        ticket.position = 2000;
        let patch = ticket.placement_patch();
        assert_eq!(patch.status, Some(TicketStatus::Accepted));
        assert_eq!(patch.position, Some(2000));
        assert_eq!(patch.updated_at, Some(ticket.updated_at));
        assert!(patch.title.is_none());
    }

    #[test]
    fn youtube_links_yield_thumbnails() {
        let expected = Some("https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string());
        assert_eq!(
            track("https://www.youtube.com/watch?v=dQw4w9WgXcQ").thumbnail_url(),
            expected
        );
        assert_eq!(track("https://youtu.be/dQw4w9WgXcQ").thumbnail_url(), expected);
        assert_eq!(
            track("https://youtube.com/shorts/dQw4w9WgXcQ").thumbnail_url(),
            expected
        );
        assert_eq!(
            track("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ").thumbnail_url(),
            expected
        );
        assert_eq!(track("https://soundcloud.com/a/b").thumbnail_url(), None);
    }

    #[test]
    fn ticket_thumbnail_uses_first_matching_track() {
        let mut ticket = Ticket::new(1, "t", 7, ts("2026-03-01T10:00:00Z"));
        ticket.tracks = vec![
            track("https://soundcloud.com/a/b"),
            track("https://youtu.be/abcdefghijk"),
        ];
        assert_eq!(
            ticket.thumbnail_url().as_deref(),
            Some("https://img.youtube.com/vi/abcdefghijk/hqdefault.jpg")
        );
    }

    #[test]
    fn tempo_ratio_requires_both_positive() {
        let mut t = track("x");
        assert_eq!(t.tempo_ratio(), None);
        t.base_bpm = Some(120.0);
        t.target_bpm = Some(90.0);
        assert_eq!(t.tempo_ratio(), Some(0.75));
        t.base_bpm = Some(0.0);
        assert_eq!(t.tempo_ratio(), None);
    }

    #[test]
    fn deadline_parsing_is_lenient() {
        assert_eq!(
            parse_deadline(Some("2026-04-01")),
            Some(ts("2026-04-01T00:00:00Z"))
        );
        assert_eq!(
            parse_deadline(Some("2026-04-01T15:30:00+02:00")),
            Some(ts("2026-04-01T13:30:00Z"))
        );
        assert_eq!(parse_deadline(Some("next tuesday")), None);
        assert_eq!(parse_deadline(Some("   ")), None);
        assert_eq!(parse_deadline(None), None);
    }

    #[test]
    fn ticket_deserializes_without_optional_fields() {
        let json = serde_json::json!({
            "id": 5,
            "title": "Competition cut",
            "status": "pending",
            "position": 1000,
            "created_at": "2026-03-01T10:00:00Z",
            "updated_at": "2026-03-01T10:00:00Z",
            "user_id": 9
        });
        let ticket: Ticket = serde_json::from_value(json).unwrap();
        assert_eq!(ticket.status, TicketStatus::New);
        assert!(ticket.tracks.is_empty());
        assert!(ticket.profiles.is_none());
    }
}
