use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use songtailor_core::board::{categorize, classify, ReorderCommand, TicketBoard, POSITION_STEP};
use songtailor_core::status::TicketStatus;
use songtailor_core::ticket::Ticket;
use songtailor_core::types::{DbId, Timestamp};

fn reference_now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

fn arb_status() -> impl Strategy<Value = TicketStatus> {
    prop::sample::select(TicketStatus::ALL.to_vec())
}

/// Deadline offset in hours relative to `reference_now`, or none.
fn arb_deadline() -> impl Strategy<Value = Option<i64>> {
    prop::option::of(-24 * 30i64..24 * 30)
}

fn arb_board() -> impl Strategy<Value = Vec<Ticket>> {
    prop::collection::vec((arb_status(), arb_deadline()), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (status, offset))| {
                let id = i as DbId + 1;
                let mut t = Ticket::new(id, format!("ticket {id}"), 1, reference_now());
                t.status = status;
                t.position = (i as i32 + 1) * POSITION_STEP;
                t.deadline = offset.map(|h| reference_now() + Duration::hours(h));
                t
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn categorize_is_a_partition(tickets in arb_board()) {
        let view = categorize(&tickets, reference_now());
        prop_assert_eq!(view.len(), tickets.len());

        for ticket in &tickets {
            let bucket = view.get(classify(ticket, reference_now()));
            prop_assert_eq!(bucket.iter().filter(|t| t.id == ticket.id).count(), 1);
        }
        for done in &view.completed {
            prop_assert!(done.status.is_terminal());
        }
    }

    #[test]
    fn reorder_leaves_destination_evenly_spaced(
        tickets in arb_board().prop_filter("non-empty", |t| !t.is_empty()),
        pick in any::<prop::sample::Index>(),
        destination in arb_status(),
        index in 0usize..50,
    ) {
        let id = tickets[pick.index(tickets.len())].id;
        let mut board = TicketBoard::new(tickets.clone());
        let command = ReorderCommand {
            ticket_id: id,
            source_status: None,
            destination_status: destination,
            destination_index: index,
        };

        let write = board.reorder(&command, reference_now()).unwrap();

        prop_assert_eq!(board.len(), tickets.len());
        prop_assert_eq!(board.get(id).unwrap().status, destination);

        if write.is_some() {
            let positions: Vec<i32> = board.bucket(destination).map(|t| t.position).collect();
            let expected: Vec<i32> =
                (1..=positions.len() as i32).map(|k| k * POSITION_STEP).collect();
            prop_assert_eq!(positions, expected);
        } else {
            let fresh = TicketBoard::new(tickets.clone());
            prop_assert_eq!(board.tickets(), fresh.tickets());
        }

        for status in TicketStatus::ALL {
            let mut seen: Vec<i32> = board.bucket(status).map(|t| t.position).collect();
            let before = seen.len();
            seen.dedup();
            prop_assert_eq!(seen.len(), before, "duplicate position in {}", status);
        }
    }
}
