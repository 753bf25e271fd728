// libs/triage-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use serde::Deserialize;
use chrono::{NaiveDate, Utc};

use shared_config::AppConfig;
use shared_models::auth::{RequestContext, User};
use shared_models::error::AppError;

use crate::models::{RecordVitalsRequest, TriageError};
use crate::services::queue::TriageQueueService;
use crate::services::vitals::VitalsService;

#[derive(Debug, Deserialize)]
pub struct TriageQueueQuery {
    pub date: Option<NaiveDate>,
}

fn map_triage_error(err: TriageError) -> AppError {
    match err {
        TriageError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        TriageError::ValidationError(msg) => AppError::BadRequest(msg),
        TriageError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// The day's triage queue, most urgent first. Defaults to today.
#[axum::debug_handler]
pub async fn get_triage_queue(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<TriageQueueQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let queue_service = TriageQueueService::new(&state);

    let queue = queue_service
        .queue_for_date(date, &ctx, auth.token())
        .await
        .map_err(map_triage_error)?;

    Ok(Json(json!({
        "date": date,
        "count": queue.len(),
        "queue": queue,
    })))
}

/// Append a vitals snapshot for a patient (nursing station).
#[axum::debug_handler]
pub async fn record_vitals(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<RecordVitalsRequest>,
) -> Result<Json<Value>, AppError> {
    match user.role.as_deref() {
        Some("nurse") | Some("receptionist") | Some("admin") => {},
        _ => return Err(AppError::Auth("Not authorized to record vital signs".to_string())),
    }

    let vitals_service = VitalsService::new(&state);

    let record = vitals_service
        .record_vitals(request, &ctx, auth.token())
        .await
        .map_err(map_triage_error)?;

    Ok(Json(json!({
        "success": true,
        "vitals": record,
    })))
}
