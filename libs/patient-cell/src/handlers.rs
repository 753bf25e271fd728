// libs/patient-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use serde::Deserialize;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{RequestContext, User};
use shared_models::error::AppError;

use crate::models::{CreatePatientRequest, PatientError, UpdatePatientRequest};
use crate::services::patient::PatientService;
use crate::services::registration::RegistrationService;

#[derive(Debug, Deserialize)]
pub struct PatientSearchQuery {
    pub name: Option<String>,
}

fn map_patient_error(err: PatientError) -> AppError {
    match err {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::DuplicatePhoneNumber => {
            AppError::Conflict("A patient with this phone number is already registered".to_string())
        },
        PatientError::ValidationError(msg) => AppError::BadRequest(msg),
        PatientError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Register a patient and auto-book today's first free slot. Always answers
/// 201 when the patient is created; the message says whether a slot was
/// found.
#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Response, AppError> {
    require_front_desk(&user)?;
    let registration_service = RegistrationService::new(&state);

    let outcome = registration_service
        .register_patient(request, &ctx, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "patient": outcome.patient,
            "appointment": outcome.appointment,
            "message": outcome.message,
        })),
    ).into_response())
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(ctx): Extension<RequestContext>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_service = PatientService::new(&state);

    let patient = patient_service
        .get_patient(patient_id, &ctx, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({ "patient": patient })))
}

/// Update mutable patient fields (contact and medical details).
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    require_front_desk(&user)?;
    let patient_service = PatientService::new(&state);

    let patient = patient_service
        .update_patient(patient_id, request, &ctx, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient,
    })))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patient_service = PatientService::new(&state);

    let patients = patient_service
        .search_patients(query.name.as_deref(), &ctx, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "count": patients.len(),
        "patients": patients,
    })))
}

fn require_front_desk(user: &User) -> Result<(), AppError> {
    match user.role.as_deref() {
        Some("receptionist") | Some("nurse") | Some("admin") => Ok(()),
        _ => Err(AppError::Auth("Not authorized to manage patient records".to_string())),
    }
}
