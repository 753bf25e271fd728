// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::RequestContext;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest,
    RecurringAppointmentRequest, RescheduleAppointmentRequest, ScheduleError,
    SlotAvailability, SlotTime,
};
use crate::services::conflict::{booked_starts, first_free_slot, ConflictDetectionService};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::recurring::expand_dates;
use crate::services::slots::{is_grid_slot, mark_availability, slot_end};

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let conflict_service = ConflictDetectionService::new(Arc::clone(&supabase));
        let lifecycle_service = AppointmentLifecycleService::new();

        Self {
            conflict_service,
            lifecycle_service,
            supabase,
        }
    }

    /// The full slot grid for a date with booked slots flagged, for the manual
    /// booking screen. Only scheduled appointments occupy slots here.
    pub async fn day_schedule(
        &self,
        date: NaiveDate,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Vec<SlotAvailability>, ScheduleError> {
        let scheduled = self.conflict_service
            .appointments_for_date(date, &[AppointmentStatus::Scheduled], ctx, auth_token)
            .await?;

        Ok(mark_availability(&booked_starts(&scheduled)))
    }

    /// Manual booking of a chosen grid slot. The availability the caller saw
    /// is advisory; a concurrent booking of the same slot loses here with the
    /// typed SlotTaken and is steered to pick a different time.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        info!("Booking appointment for patient {} on {} at {}",
              request.patient_id, request.scheduled_date, request.start_time);

        if !is_grid_slot(request.start_time) {
            return Err(ScheduleError::InvalidTime(
                format!("{} is not a bookable slot", request.start_time)
            ));
        }

        self.insert_appointment(
            request.patient_id,
            request.doctor_id,
            request.scheduled_date,
            request.start_time,
            request.notes,
            ctx,
            auth_token,
        ).await
    }

    /// Automatic allocation on patient registration: first grid slot whose
    /// 15-minute interval overlaps no existing scheduled or arrived
    /// appointment today. Exhaustion is reported, never swallowed - the
    /// caller downgrades to a partial success.
    pub async fn allocate_first_free(
        &self,
        patient_id: Uuid,
        date: NaiveDate,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        debug!("Auto-allocating a slot for patient {} on {}", patient_id, date);

        let existing = self.conflict_service
            .appointments_for_date(
                date,
                &[AppointmentStatus::Scheduled, AppointmentStatus::Arrived],
                ctx,
                auth_token,
            )
            .await?;

        let slot = first_free_slot(&existing).ok_or(ScheduleError::NoFreeSlot)?;

        // The automatic path writes HH:MM:SS, matching the time column format
        self.insert_appointment(
            patient_id,
            None,
            date,
            slot.with_seconds(),
            None,
            ctx,
            auth_token,
        ).await
    }

    /// Expand a recurrence and submit every generated date as one batch
    /// insert. The batch is atomic: a uniqueness rejection on any date fails
    /// the whole request with SlotTaken.
    pub async fn book_recurring(
        &self,
        request: RecurringAppointmentRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        if request.end_date < request.start_date {
            return Err(ScheduleError::ValidationError(
                "Recurrence end date is before its start date".to_string()
            ));
        }

        if !is_grid_slot(request.start_time) {
            return Err(ScheduleError::InvalidTime(
                format!("{} is not a bookable slot", request.start_time)
            ));
        }

        let dates = expand_dates(request.start_date, request.end_date, request.frequency);
        info!("Booking recurring appointment for patient {}: {} occurrences",
              request.patient_id, dates.len());

        let now = Utc::now();
        let rows: Vec<Value> = dates.iter().map(|date| {
            self.appointment_row(
                request.patient_id,
                request.doctor_id,
                *date,
                request.start_time,
                request.notes.clone(),
                ctx,
                now,
            )
        }).collect();

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(Value::Array(rows)),
            Some(headers),
        ).await.map_err(|e| {
            if e.is_conflict() {
                warn!("Recurring batch rejected by uniqueness guard for patient {}",
                      request.patient_id);
            }
            ScheduleError::from_db(e)
        })?;

        let appointments: Vec<Appointment> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        Ok(appointments)
    }

    /// Get appointment by ID
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&hospital_id=eq.{}",
            appointment_id, ctx.hospital_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(ScheduleError::from_db)?;

        if result.is_empty() {
            return Err(ScheduleError::NotFound);
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse appointment: {}", e)))?;

        Ok(appointment)
    }

    /// Move an appointment through its lifecycle. Completion is the doctor's
    /// close-out and is what downstream billing listens for.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        let current = self.get_appointment(appointment_id, ctx, auth_token).await?;

        self.lifecycle_service.validate_status_transition(&current.status, &new_status)?;

        let update_data = json!({
            "status": new_status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let updated = self.patch_appointment(appointment_id, update_data, ctx, auth_token).await?;

        info!("Appointment {} moved {} -> {}", appointment_id, current.status, new_status);
        Ok(updated)
    }

    /// Reschedule a still-scheduled appointment to a new date/time. Status is
    /// unchanged; the uniqueness guard arbitrates races on the new slot.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        debug!("Rescheduling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, ctx, auth_token).await?;

        if !self.lifecycle_service.can_reschedule(&current.status) {
            return Err(ScheduleError::InvalidStatusTransition(current.status));
        }

        if !is_grid_slot(request.new_start_time) {
            return Err(ScheduleError::InvalidTime(
                format!("{} is not a bookable slot", request.new_start_time)
            ));
        }

        let mut update_data = serde_json::Map::new();
        update_data.insert("scheduled_date".to_string(), json!(request.new_date));
        update_data.insert("start_time".to_string(), json!(request.new_start_time));
        update_data.insert("end_time".to_string(), json!(slot_end(request.new_start_time)));
        if let Some(reason) = request.reason {
            update_data.insert("notes".to_string(), json!(reason));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated = self.patch_appointment(
            appointment_id,
            Value::Object(update_data),
            ctx,
            auth_token,
        ).await?;

        info!("Appointment {} rescheduled to {} {}",
              appointment_id, request.new_date, request.new_start_time);
        Ok(updated)
    }

    /// Cancel an appointment at any point before completion.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        self.update_status(appointment_id, AppointmentStatus::Cancelled, ctx, auth_token).await
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    fn appointment_row(
        &self,
        patient_id: Uuid,
        doctor_id: Option<Uuid>,
        date: NaiveDate,
        start_time: SlotTime,
        notes: Option<String>,
        ctx: &RequestContext,
        now: chrono::DateTime<Utc>,
    ) -> Value {
        json!({
            "hospital_id": ctx.hospital_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "scheduled_date": date,
            "start_time": start_time,
            "end_time": slot_end(start_time),
            "status": AppointmentStatus::Scheduled.to_string(),
            "notes": notes,
            "created_by": ctx.actor_id,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        })
    }

    async fn insert_appointment(
        &self,
        patient_id: Uuid,
        doctor_id: Option<Uuid>,
        date: NaiveDate,
        start_time: SlotTime,
        notes: Option<String>,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        let row = self.appointment_row(
            patient_id, doctor_id, date, start_time, notes, ctx, Utc::now(),
        );

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(row),
            Some(headers),
        ).await.map_err(|e| {
            if e.is_conflict() {
                warn!("Slot {} on {} lost to a concurrent booking", start_time, date);
            }
            ScheduleError::from_db(e)
        })?;

        if result.is_empty() {
            return Err(ScheduleError::DatabaseError("Failed to create appointment".to_string()));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse created appointment: {}", e)))?;

        info!("Appointment {} booked for patient {} at {} {}",
              appointment.id, patient_id, date, start_time);
        Ok(appointment)
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        update_data: Value,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&hospital_id=eq.{}",
            appointment_id, ctx.hospital_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(ScheduleError::from_db)?;

        if result.is_empty() {
            return Err(ScheduleError::DatabaseError("Failed to update appointment".to_string()));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse updated appointment: {}", e)))?;

        Ok(appointment)
    }
}
