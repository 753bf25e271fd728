// libs/scheduling-cell/tests/lifecycle_test.rs
use assert_matches::assert_matches;

use scheduling_cell::models::{AppointmentStatus, ScheduleError};
use scheduling_cell::services::lifecycle::AppointmentLifecycleService;

#[test]
fn scheduled_patient_can_arrive_or_cancel() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Scheduled, &AppointmentStatus::Arrived)
        .is_ok());
    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Scheduled, &AppointmentStatus::Cancelled)
        .is_ok());
}

#[test]
fn scheduled_patient_cannot_jump_to_completed() {
    let lifecycle = AppointmentLifecycleService::new();

    let result = lifecycle
        .validate_status_transition(&AppointmentStatus::Scheduled, &AppointmentStatus::Completed);

    assert_matches!(result, Err(ScheduleError::InvalidStatusTransition(AppointmentStatus::Scheduled)));
}

#[test]
fn arrived_patient_completes_or_cancels() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Arrived, &AppointmentStatus::Completed)
        .is_ok());
    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Arrived, &AppointmentStatus::Cancelled)
        .is_ok());
}

#[test]
fn terminal_states_allow_no_transitions() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle.get_valid_transitions(&AppointmentStatus::Completed).is_empty());
    assert!(lifecycle.get_valid_transitions(&AppointmentStatus::Cancelled).is_empty());

    let result = lifecycle
        .validate_status_transition(&AppointmentStatus::Completed, &AppointmentStatus::Scheduled);
    assert_matches!(result, Err(ScheduleError::InvalidStatusTransition(AppointmentStatus::Completed)));
}

#[test]
fn only_scheduled_appointments_reschedule() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle.can_reschedule(&AppointmentStatus::Scheduled));
    assert!(!lifecycle.can_reschedule(&AppointmentStatus::Arrived));
    assert!(!lifecycle.can_reschedule(&AppointmentStatus::Completed));
    assert!(!lifecycle.can_reschedule(&AppointmentStatus::Cancelled));
}
