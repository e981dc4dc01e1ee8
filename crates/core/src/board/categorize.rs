//! Deadline-based categorization of the board.
//!
//! A derived, never-persisted view. Recompute it whenever the collection or
//! the reference instant changes.

use chrono::Duration;
use serde::Serialize;

use crate::ticket::Ticket;
use crate::types::Timestamp;

/// Width of the "due this week" window, inclusive at both ends.
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

/// The bucket a ticket falls into relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueCategory {
    /// Deadline strictly before `now`, not done.
    Overdue,
    /// Deadline in `[now, now + 7 days]`, not done.
    DueThisWeek,
    /// Deadline after `now + 7 days`, not done.
    Upcoming,
    /// No deadline, not done.
    Backlog,
    /// Done, regardless of deadline.
    Completed,
}

/// Classify a single ticket.
pub fn classify(ticket: &Ticket, now: Timestamp) -> DueCategory {
    if ticket.status.is_terminal() {
        return DueCategory::Completed;
    }
    match ticket.deadline {
        None => DueCategory::Backlog,
        Some(deadline) if deadline < now => DueCategory::Overdue,
        Some(deadline) if deadline <= now + Duration::days(DUE_SOON_WINDOW_DAYS) => {
            DueCategory::DueThisWeek
        }
        Some(_) => DueCategory::Upcoming,
    }
}

/// The board partitioned into disjoint, render-ready buckets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorizedTickets {
    pub overdue: Vec<Ticket>,
    pub due_this_week: Vec<Ticket>,
    pub upcoming: Vec<Ticket>,
    pub backlog: Vec<Ticket>,
    pub completed: Vec<Ticket>,
}

impl CategorizedTickets {
    pub fn get(&self, category: DueCategory) -> &[Ticket] {
        match category {
            DueCategory::Overdue => &self.overdue,
            DueCategory::DueThisWeek => &self.due_this_week,
            DueCategory::Upcoming => &self.upcoming,
            DueCategory::Backlog => &self.backlog,
            DueCategory::Completed => &self.completed,
        }
    }

    /// Total number of tickets across all buckets.
    pub fn len(&self) -> usize {
        self.overdue.len()
            + self.due_this_week.len()
            + self.upcoming.len()
            + self.backlog.len()
            + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, category: DueCategory) -> &mut Vec<Ticket> {
        match category {
            DueCategory::Overdue => &mut self.overdue,
            DueCategory::DueThisWeek => &mut self.due_this_week,
            DueCategory::Upcoming => &mut self.upcoming,
            DueCategory::Backlog => &mut self.backlog,
            DueCategory::Completed => &mut self.completed,
        }
    }
}

/// Partition `tickets` by [`classify`] against `now`.
///
/// Deadline-bearing buckets are ordered soonest first; backlog and completed
/// keep the input order.
pub fn categorize(tickets: &[Ticket], now: Timestamp) -> CategorizedTickets {
    let mut out = CategorizedTickets::default();
    for ticket in tickets {
        out.bucket_mut(classify(ticket, now)).push(ticket.clone());
    }
    for bucket in [&mut out.overdue, &mut out.due_this_week, &mut out.upcoming] {
        bucket.sort_by_key(|t| t.deadline);
    }
    out
}
