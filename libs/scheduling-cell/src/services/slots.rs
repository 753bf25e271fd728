// libs/scheduling-cell/src/services/slots.rs
use std::collections::HashSet;

use crate::models::{SlotAvailability, SlotTime};

/// The booking day runs 08:00 (inclusive) to 17:00 (exclusive).
pub const OPENING_HOUR: u8 = 8;
pub const CLOSING_HOUR: u8 = 17;
pub const SLOT_MINUTES: u32 = 15;

/// The fixed catalog of bookable slots for any day: every 15-minute boundary
/// in the booking window, 36 slots from 08:00 through 16:45.
pub fn daily_slots() -> Vec<SlotTime> {
    let mut slots = Vec::new();
    let mut current = SlotTime::new(OPENING_HOUR, 0);
    let closing = SlotTime::new(CLOSING_HOUR, 0);

    while current < closing {
        slots.push(current);
        current = current.plus_minutes(SLOT_MINUTES);
    }

    slots
}

/// End of the slot starting at `start`.
pub fn slot_end(start: SlotTime) -> SlotTime {
    start.plus_minutes(SLOT_MINUTES)
}

/// True when `start` is one of the grid's bookable slots.
pub fn is_grid_slot(start: SlotTime) -> bool {
    daily_slots().iter().any(|slot| *slot == start)
}

/// Mark each grid slot against the booked set of start times. Advisory only -
/// the UI disables booked slots, the datastore guard rejects races.
pub fn mark_availability(booked: &HashSet<SlotTime>) -> Vec<SlotAvailability> {
    daily_slots()
        .into_iter()
        .map(|start| SlotAvailability {
            start_time: start,
            end_time: slot_end(start),
            booked: booked.contains(&start),
        })
        .collect()
}
