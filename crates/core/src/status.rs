//! Ticket lifecycle status and its transitions.
//!
//! The canonical spelling is snake_case (`new`, `accepted`, `in_progress`,
//! `done`). Older clients used `pending`, `queue`, `in progress` and
//! `completed`; those are accepted on ingestion and normalized here so no
//! other module ever sees an alias.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of a ticket.
///
/// Variant order is the board's column order and is used when merging
/// buckets back into one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[serde(alias = "pending")]
    New,
    #[serde(alias = "queue", alias = "queued")]
    Accepted,
    #[serde(alias = "in progress", alias = "in-progress")]
    InProgress,
    #[serde(alias = "completed")]
    Done,
}

impl TicketStatus {
    /// Number of statuses (board columns).
    pub const COUNT: usize = 4;

    /// Every status in board column order.
    pub const ALL: [TicketStatus; Self::COUNT] = [
        TicketStatus::New,
        TicketStatus::Accepted,
        TicketStatus::InProgress,
        TicketStatus::Done,
    ];

    /// Status assigned to freshly submitted tickets.
    pub const INITIAL: TicketStatus = TicketStatus::New;

    /// Canonical string stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::Accepted => "accepted",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Done => "done",
        }
    }

    /// The single-step forward transition.
    ///
    /// Returns `None` for the terminal state.
    pub fn next(self) -> Option<TicketStatus> {
        match self {
            TicketStatus::New => Some(TicketStatus::Accepted),
            TicketStatus::Accepted => Some(TicketStatus::InProgress),
            TicketStatus::InProgress => Some(TicketStatus::Done),
            TicketStatus::Done => None,
        }
    }

    /// Whether forward advancement is a no-op from this state.
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Zero-based column index on the board.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = CoreError;

    /// Parse a stored or submitted status, accepting legacy aliases in any
    /// case. Unknown values are a data-integrity error.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "new" | "pending" => Ok(TicketStatus::New),
            "accepted" | "queue" | "queued" => Ok(TicketStatus::Accepted),
            "in_progress" => Ok(TicketStatus::InProgress),
            "done" | "completed" => Ok(TicketStatus::Done),
            _ => Err(CoreError::DataIntegrity(format!(
                "Unknown ticket status '{raw}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn advance_follows_fixed_sequence() {
        assert_eq!(TicketStatus::New.next(), Some(TicketStatus::Accepted));
        assert_eq!(TicketStatus::Accepted.next(), Some(TicketStatus::InProgress));
        assert_eq!(TicketStatus::InProgress.next(), Some(TicketStatus::Done));
        assert_eq!(TicketStatus::Done.next(), None);
    }

    #[test]
    fn only_done_is_terminal() {
        let terminal: Vec<_> = TicketStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![TicketStatus::Done]);
    }

    #[test]
    fn ordinals_follow_column_order() {
        for (i, status) in TicketStatus::ALL.into_iter().enumerate() {
            assert_eq!(status.ordinal(), i);
        }
    }

    #[test]
    fn parse_accepts_canonical_and_legacy_spellings() {
        assert_eq!("new".parse::<TicketStatus>().unwrap(), TicketStatus::New);
        assert_eq!("Pending".parse::<TicketStatus>().unwrap(), TicketStatus::New);
        assert_eq!("queue".parse::<TicketStatus>().unwrap(), TicketStatus::Accepted);
        assert_eq!(
            "in progress".parse::<TicketStatus>().unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!(
            "in_progress".parse::<TicketStatus>().unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!("COMPLETED".parse::<TicketStatus>().unwrap(), TicketStatus::Done);
    }

    #[test]
    fn parse_rejects_unknown_status() {
        assert_matches!(
            "archived".parse::<TicketStatus>(),
            Err(CoreError::DataIntegrity(msg)) if msg.contains("archived")
        );
        assert!("".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn serde_writes_canonical_and_reads_aliases() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let parsed: TicketStatus = serde_json::from_str("\"in progress\"").unwrap();
        assert_eq!(parsed, TicketStatus::InProgress);
        let parsed: TicketStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, TicketStatus::Done);
        assert!(serde_json::from_str::<TicketStatus>("\"bogus\"").is_err());
    }

    #[test]
    fn display_matches_as_str() {
        for status in TicketStatus::ALL {
            assert_eq!(status.to_string(), status.as_str());
        }
    }
}
