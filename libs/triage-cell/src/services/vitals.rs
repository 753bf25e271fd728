// libs/triage-cell/src/services/vitals.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::RequestContext;

use crate::models::{RecordVitalsRequest, TriageError, VitalSignsRecord};

pub struct VitalsService {
    supabase: Arc<SupabaseClient>,
}

impl VitalsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All vitals recorded on a date for the hospital, oldest first.
    pub async fn vitals_for_date(
        &self,
        date: NaiveDate,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Vec<VitalSignsRecord>, TriageError> {
        debug!("Fetching vitals for hospital {} on {}", ctx.hospital_id, date);

        let day_start = format!("{}T00:00:00Z", date);
        let day_end = format!("{}T23:59:59Z", date);

        let path = format!(
            "/rest/v1/vital_signs?hospital_id=eq.{}&recorded_at=gte.{}&recorded_at=lte.{}&order=recorded_at.asc",
            ctx.hospital_id,
            urlencoding::encode(&day_start),
            urlencoding::encode(&day_end),
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(TriageError::from_db)?;

        let records: Vec<VitalSignsRecord> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<VitalSignsRecord>, _>>()
            .map_err(|e| TriageError::DatabaseError(format!("Failed to parse vital signs: {}", e)))?;

        Ok(records)
    }

    /// Append a vitals snapshot. Records are never updated afterwards.
    pub async fn record_vitals(
        &self,
        request: RecordVitalsRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<VitalSignsRecord, TriageError> {
        debug!("Recording vitals for patient {}", request.patient_id);

        let vitals_data = json!({
            "hospital_id": ctx.hospital_id,
            "patient_id": request.patient_id,
            "temperature_celsius": request.temperature_celsius,
            "heart_rate_bpm": request.heart_rate_bpm,
            "systolic_mmhg": request.systolic_mmhg,
            "diastolic_mmhg": request.diastolic_mmhg,
            "oxygen_saturation_pct": request.oxygen_saturation_pct,
            "weight_kg": request.weight_kg,
            "complaints": request.complaints,
            "recorded_by": ctx.actor_id,
            "recorded_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/vital_signs",
            Some(auth_token),
            Some(vitals_data),
            Some(headers),
        ).await.map_err(TriageError::from_db)?;

        if result.is_empty() {
            return Err(TriageError::DatabaseError("Failed to record vital signs".to_string()));
        }

        let record: VitalSignsRecord = serde_json::from_value(result[0].clone())
            .map_err(|e| TriageError::DatabaseError(format!("Failed to parse vital signs: {}", e)))?;

        Ok(record)
    }
}
