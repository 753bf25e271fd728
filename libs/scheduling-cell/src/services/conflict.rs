// libs/scheduling-cell/src/services/conflict.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_database::supabase::SupabaseClient;
use shared_models::auth::RequestContext;

use crate::models::{Appointment, AppointmentStatus, ScheduleError, SlotTime};
use crate::services::slots::{daily_slots, slot_end};

/// Half-open interval overlap: `[start1, end1)` intersects `[start2, end2)`.
pub fn slots_overlap(start1: SlotTime, end1: SlotTime, start2: SlotTime, end2: SlotTime) -> bool {
    start1 < end2 && start2 < end1
}

/// Walk the slot catalog in order and pick the first slot whose 15-minute
/// interval overlaps none of the existing appointments. `None` means the day
/// is fully booked - callers surface that explicitly, never silently.
pub fn first_free_slot(existing: &[Appointment]) -> Option<SlotTime> {
    daily_slots().into_iter().find(|candidate| {
        let candidate_end = slot_end(*candidate);
        !existing.iter().any(|appointment| {
            slots_overlap(
                *candidate,
                candidate_end,
                appointment.start_time,
                appointment.end_time,
            )
        })
    })
}

/// Start times of a date's scheduled appointments - the booked set the manual
/// grid is marked against.
pub fn booked_starts(appointments: &[Appointment]) -> HashSet<SlotTime> {
    appointments.iter().map(|appointment| appointment.start_time).collect()
}

pub struct ConflictDetectionService {
    supabase: Arc<SupabaseClient>,
}

impl ConflictDetectionService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Fetch the hospital's appointments for a date, filtered to the given
    /// statuses, ordered by start time.
    pub async fn appointments_for_date(
        &self,
        date: NaiveDate,
        statuses: &[AppointmentStatus],
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        debug!("Fetching appointments for hospital {} on {}", ctx.hospital_id, date);

        let status_filter = statuses
            .iter()
            .map(|status| status.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let path = format!(
            "/rest/v1/appointments?hospital_id=eq.{}&scheduled_date=eq.{}&status=in.({})&order=start_time.asc",
            ctx.hospital_id, date, status_filter
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(ScheduleError::from_db)?;

        let appointments: Vec<Appointment> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        Ok(appointments)
    }
}
