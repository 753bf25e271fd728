// libs/patient-cell/src/services/patient.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::RequestContext;

use crate::models::{CreatePatientRequest, Patient, PatientError, UpdatePatientRequest};

pub struct PatientService {
    supabase: Arc<SupabaseClient>,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Creating new patient record: {} {}", request.first_name, request.last_name);

        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(PatientError::ValidationError("Patient name is required".to_string()));
        }

        // Duplicate check on phone number within the hospital
        if let Some(ref phone) = request.phone_number {
            let existing_check_path = format!(
                "/rest/v1/patients?hospital_id=eq.{}&phone_number=eq.{}",
                ctx.hospital_id,
                urlencoding::encode(phone),
            );
            let existing: Vec<Value> = self.supabase.request(
                Method::GET,
                &existing_check_path,
                Some(auth_token),
                None,
            ).await.map_err(PatientError::from_db)?;

            if !existing.is_empty() {
                return Err(PatientError::DuplicatePhoneNumber);
            }
        }

        let now = Utc::now();
        let patient_data = json!({
            "hospital_id": ctx.hospital_id,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "date_of_birth": request.date_of_birth,
            "gender": request.gender,
            "phone_number": request.phone_number,
            "address": request.address,
            "allergies": request.allergies,
            "chronic_conditions": request.chronic_conditions,
            "current_medications": request.current_medications,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patients",
            Some(auth_token),
            Some(patient_data),
            Some(headers),
        ).await.map_err(PatientError::from_db)?;

        if result.is_empty() {
            return Err(PatientError::DatabaseError("Failed to create patient record".to_string()));
        }

        let patient: Patient = serde_json::from_value(result[0].clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))?;

        debug!("Patient record created with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn get_patient(
        &self,
        patient_id: Uuid,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Fetching patient record: {}", patient_id);

        let path = format!(
            "/rest/v1/patients?id=eq.{}&hospital_id=eq.{}",
            patient_id, ctx.hospital_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(PatientError::from_db)?;

        if result.is_empty() {
            return Err(PatientError::NotFound);
        }

        let patient: Patient = serde_json::from_value(result[0].clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))?;

        Ok(patient)
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient record: {}", patient_id);

        let mut update_data = serde_json::Map::new();

        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(phone_number) = request.phone_number {
            update_data.insert("phone_number".to_string(), json!(phone_number));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(allergies) = request.allergies {
            update_data.insert("allergies".to_string(), json!(allergies));
        }
        if let Some(chronic_conditions) = request.chronic_conditions {
            update_data.insert("chronic_conditions".to_string(), json!(chronic_conditions));
        }
        if let Some(current_medications) = request.current_medications {
            update_data.insert("current_medications".to_string(), json!(current_medications));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!(
            "/rest/v1/patients?id=eq.{}&hospital_id=eq.{}",
            patient_id, ctx.hospital_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(PatientError::from_db)?;

        if result.is_empty() {
            return Err(PatientError::NotFound);
        }

        let patient: Patient = serde_json::from_value(result[0].clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))?;

        Ok(patient)
    }

    pub async fn search_patients(
        &self,
        name_query: Option<&str>,
        ctx: &RequestContext,
        auth_token: &str,
    ) -> Result<Vec<Patient>, PatientError> {
        let mut path = format!(
            "/rest/v1/patients?hospital_id=eq.{}&order=last_name.asc&limit=50",
            ctx.hospital_id
        );

        if let Some(name) = name_query {
            path.push_str(&format!("&last_name=ilike.{}", urlencoding::encode(&format!("{}%", name))));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(PatientError::from_db)?;

        let patients: Vec<Patient> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Patient>, _>>()
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patients: {}", e)))?;

        Ok(patients)
    }
}
