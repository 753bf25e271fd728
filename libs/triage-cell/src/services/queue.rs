// libs/triage-cell/src/services/queue.rs
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::RequestContext;

use scheduling_cell::models::{Appointment, AppointmentStatus};
use scheduling_cell::services::conflict::ConflictDetectionService;

use crate::models::{TriageError, TriageQueueEntry, VitalSignsRecord};
use crate::services::scoring::{classify, priority_score};
use crate::services::vitals::VitalsService;

/// Derives the day's triage queue. The queue is recomputed from the datastore
/// on every fetch; realtime notifications only prompt a re-fetch.
pub struct TriageQueueService {
    vitals_service: VitalsService,
    conflict_service: ConflictDetectionService,
}

impl TriageQueueService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            vitals_service: VitalsService::with_client(Arc::clone(&supabase)),
            conflict_service: ConflictDetectionService::new(supabase),
        }
    }

    pub async fn queue_for_date(
        &self,
        date: NaiveDate,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Vec<TriageQueueEntry>, TriageError> {
        let vitals = self.vitals_service
            .vitals_for_date(date, ctx, auth_token)
            .await?;

        // Same-day appointments still awaiting the doctor
        let appointments = self.conflict_service
            .appointments_for_date(
                date,
                &[AppointmentStatus::Scheduled, AppointmentStatus::Arrived],
                ctx,
                auth_token,
            )
            .await
            .map_err(|e| TriageError::DatabaseError(e.to_string()))?;

        let queue = build_queue(vitals, appointments);
        debug!("Derived triage queue of {} entries for {}", queue.len(), date);

        Ok(queue)
    }
}

/// Join the day's vitals with same-day open appointments and order the result.
/// Pure function: re-invokable on every refresh without side effects.
///
/// A patient with several snapshots on the day is represented by the first
/// one recorded - triage rank is earned at check-in and later re-checks do
/// not reshuffle the queue.
pub fn build_queue(
    vitals: Vec<VitalSignsRecord>,
    appointments: Vec<Appointment>,
) -> Vec<TriageQueueEntry> {
    let mut representative: HashMap<Uuid, VitalSignsRecord> = HashMap::new();
    for record in vitals {
        match representative.get(&record.patient_id) {
            Some(existing) if existing.recorded_at <= record.recorded_at => {},
            _ => {
                representative.insert(record.patient_id, record);
            },
        }
    }

    // Earliest open appointment per patient
    let mut patient_appointments: HashMap<Uuid, Appointment> = HashMap::new();
    for appointment in appointments {
        match patient_appointments.get(&appointment.patient_id) {
            Some(existing) if existing.start_time <= appointment.start_time => {},
            _ => {
                patient_appointments.insert(appointment.patient_id, appointment);
            },
        }
    }

    let mut entries: Vec<TriageQueueEntry> = representative
        .into_values()
        .map(|record| {
            let score = priority_score(&record);
            TriageQueueEntry {
                patient_id: record.patient_id,
                appointment: patient_appointments.remove(&record.patient_id),
                priority_score: score,
                level: classify(score),
                vitals: record,
            }
        })
        .collect();

    entries.sort_by(compare_entries);
    entries
}

/// Total order over queue entries: urgency first, then first-recorded-first-
/// served, then appointment time with walk-ins after appointment holders,
/// then patient id so equal entries still order deterministically.
fn compare_entries(a: &TriageQueueEntry, b: &TriageQueueEntry) -> Ordering {
    b.priority_score.cmp(&a.priority_score)
        .then_with(|| a.vitals.recorded_at.cmp(&b.vitals.recorded_at))
        .then_with(|| match (&a.appointment, &b.appointment) {
            (Some(first), Some(second)) => first.start_time.cmp(&second.start_time),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.patient_id.cmp(&b.patient_id))
}
