// libs/scheduling-cell/src/handlers.rs
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
use chrono::NaiveDate;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{RequestContext, User};
use shared_models::error::AppError;

use crate::models::{
    AppointmentStatus, BookAppointmentRequest, RecurringAppointmentRequest,
    RescheduleAppointmentRequest, ScheduleError,
};
use crate::services::booking::BookingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DayScheduleQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

fn map_schedule_error(err: ScheduleError) -> AppError {
    match err {
        ScheduleError::NotFound => {
            AppError::NotFound("Appointment not found".to_string())
        },
        ScheduleError::SlotTaken => {
            AppError::Conflict("Appointment slot was just taken by another booking".to_string())
        },
        ScheduleError::NoFreeSlot => {
            AppError::Conflict("No appointment slots remaining for the day".to_string())
        },
        ScheduleError::InvalidTime(msg) => AppError::BadRequest(msg),
        ScheduleError::InvalidStatusTransition(status) => {
            AppError::BadRequest(format!("Appointment cannot be modified in current status: {}", status))
        },
        ScheduleError::ValidationError(msg) => AppError::BadRequest(msg),
        ScheduleError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// HANDLERS
// ==============================================================================

/// Slot grid for a date with booked slots flagged, for the booking screen.
#[axum::debug_handler]
pub async fn get_day_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<DayScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let schedule = booking_service
        .day_schedule(query.date, &ctx, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "date": query.date,
        "slots": schedule,
    })))
}

/// Book a chosen slot. A lost booking race answers 409 with the re-fetched
/// booked set so the client clears its selection and prompts for a new time.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Response, AppError> {
    require_staff(&user)?;
    let token = auth.token();
    let booking_service = BookingService::new(&state);
    let date = request.scheduled_date;

    match booking_service.book(request, &ctx, token).await {
        Ok(appointment) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "appointment": appointment,
            })),
        ).into_response()),
        Err(ScheduleError::SlotTaken) => {
            let schedule = booking_service
                .day_schedule(date, &ctx, token)
                .await
                .map_err(map_schedule_error)?;

            let booked_slots: Vec<String> = schedule.iter()
                .filter(|slot| slot.booked)
                .map(|slot| slot.start_time.to_string())
                .collect();

            Ok((
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "Appointment slot was just taken by another booking",
                    "clear_selection": true,
                    "booked_slots": booked_slots,
                })),
            ).into_response())
        },
        Err(e) => Err(map_schedule_error(e)),
    }
}

/// Book a repeating appointment series as one atomic batch.
#[axum::debug_handler]
pub async fn book_recurring_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<RecurringAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;
    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .book_recurring(request, &ctx, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, &ctx, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

/// Lifecycle transition: arrived (reception) or completed (doctor).
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    // Completing a visit is the doctor's close-out
    if request.status == AppointmentStatus::Completed
        && user.role.as_deref() != Some("doctor")
        && user.role.as_deref() != Some("admin") {
        return Err(AppError::Auth("Only a doctor can complete an appointment".to_string()));
    }

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .update_status(appointment_id, request.status, &ctx, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .reschedule(appointment_id, request, &ctx, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .cancel(appointment_id, &ctx, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

fn require_staff(user: &User) -> Result<(), AppError> {
    match user.role.as_deref() {
        Some("receptionist") | Some("nurse") | Some("doctor") | Some("admin") => Ok(()),
        _ => Err(AppError::Auth("Not authorized to manage appointments".to_string())),
    }
}
