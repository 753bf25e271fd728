// libs/scheduling-cell/tests/allocator_test.rs
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use scheduling_cell::models::{Appointment, AppointmentStatus, SlotTime};
use scheduling_cell::services::conflict::{booked_starts, first_free_slot, slots_overlap};
use scheduling_cell::services::slots::daily_slots;

fn appointment_at(start: &str) -> Appointment {
    let start_time: SlotTime = start.parse().unwrap();
    Appointment {
        id: Uuid::new_v4(),
        hospital_id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id: None,
        scheduled_date: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
        start_time,
        end_time: start_time.plus_minutes(15),
        status: AppointmentStatus::Scheduled,
        notes: None,
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn half_open_intervals_do_not_overlap_when_adjacent() {
    let nine: SlotTime = "09:00".parse().unwrap();
    let nine_fifteen: SlotTime = "09:15".parse().unwrap();
    let nine_thirty: SlotTime = "09:30".parse().unwrap();

    // Identical intervals collide
    assert!(slots_overlap(nine, nine_fifteen, nine, nine_fifteen));
    // Back-to-back intervals do not
    assert!(!slots_overlap(nine_fifteen, nine_thirty, nine, nine_fifteen));
    assert!(!slots_overlap(nine, nine_fifteen, nine_fifteen, nine_thirty));
}

#[test]
fn allocator_skips_a_booked_slot_and_takes_the_adjacent_one() {
    // 08:00 through 08:45 and 09:00 are taken; 08:45+15 = 09:00 overlaps the
    // 09:00 booking, so the first candidate clear of everything is 09:15
    let existing = vec![
        appointment_at("08:00"),
        appointment_at("08:15"),
        appointment_at("08:30"),
        appointment_at("08:45"),
        appointment_at("09:00"),
    ];

    let selected = first_free_slot(&existing).unwrap();
    assert_eq!(selected.to_string(), "09:15");
}

#[test]
fn allocator_never_selects_a_slot_overlapping_an_existing_booking() {
    let existing = vec![appointment_at("09:00")];

    let selected = first_free_slot(&existing).unwrap();
    // 08:00 is free, so the 09:00 collision never comes up front - but the
    // chosen slot must not overlap the 09:00-09:15 booking either way
    assert_eq!(selected.to_string(), "08:00");
    assert!(!slots_overlap(
        selected,
        selected.plus_minutes(15),
        existing[0].start_time,
        existing[0].end_time,
    ));
}

#[test]
fn allocator_respects_longer_existing_intervals() {
    // A 30-minute block recorded as one row: 10:00-10:30
    let mut long_block = appointment_at("10:00");
    long_block.end_time = "10:30".parse().unwrap();

    let mut existing: Vec<Appointment> = daily_slots()
        .into_iter()
        .take(8) // 08:00 .. 09:45 all booked
        .map(|slot| appointment_at(&slot.to_string()))
        .collect();
    existing.push(long_block);

    let selected = first_free_slot(&existing).unwrap();
    // 10:00 and 10:15 both fall inside the block
    assert_eq!(selected.to_string(), "10:30");
}

#[test]
fn fully_booked_day_yields_no_slot() {
    let existing: Vec<Appointment> = daily_slots()
        .into_iter()
        .map(|slot| appointment_at(&slot.to_string()))
        .collect();

    assert_eq!(first_free_slot(&existing), None);
}

#[test]
fn empty_day_yields_the_opening_slot() {
    let selected = first_free_slot(&[]).unwrap();
    assert_eq!(selected.to_string(), "08:00");
}

#[test]
fn booked_starts_collects_start_times_by_value() {
    let existing = vec![appointment_at("09:00:00"), appointment_at("11:30")];

    let booked = booked_starts(&existing);
    assert_eq!(booked.len(), 2);
    assert!(booked.contains(&"09:00".parse().unwrap()));
    assert!(booked.contains(&"11:30:00".parse().unwrap()));
}
