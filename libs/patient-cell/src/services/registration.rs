// libs/patient-cell/src/services/registration.rs
use chrono::Utc;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_models::auth::RequestContext;

use scheduling_cell::models::ScheduleError;
use scheduling_cell::services::booking::BookingService;

use crate::models::{CreatePatientRequest, PatientError, RegistrationOutcome};
use crate::services::patient::PatientService;

/// Front-desk registration: create the patient, then try to hand them
/// today's first free appointment slot. The appointment half is best-effort -
/// a fully booked day downgrades to a partial success and never undoes or
/// blocks the registration itself.
pub struct RegistrationService {
    patient_service: PatientService,
    booking_service: BookingService,
}

impl RegistrationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            patient_service: PatientService::new(config),
            booking_service: BookingService::new(config),
        }
    }

    pub async fn register_patient(
        &self,
        request: CreatePatientRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<RegistrationOutcome, PatientError> {
        let patient = self.patient_service
            .create_patient(request, ctx, auth_token)
            .await?;

        let today = Utc::now().date_naive();

        match self.booking_service
            .allocate_first_free(patient.id, today, ctx, auth_token)
            .await
        {
            Ok(appointment) => {
                info!("Patient {} registered with appointment at {}",
                      patient.id, appointment.start_time);
                Ok(RegistrationOutcome {
                    patient,
                    appointment: Some(appointment),
                    message: "Patient registered and appointment booked".to_string(),
                })
            },
            Err(ScheduleError::NoFreeSlot) => {
                info!("Patient {} registered; no appointment slots remaining today", patient.id);
                Ok(RegistrationOutcome {
                    patient,
                    appointment: None,
                    message: "Patient registered, but no appointment slots remain today".to_string(),
                })
            },
            Err(e) => {
                warn!("Patient {} registered; automatic appointment failed: {}", patient.id, e);
                Ok(RegistrationOutcome {
                    patient,
                    appointment: None,
                    message: "Patient registered, but the appointment could not be booked".to_string(),
                })
            },
        }
    }
}
