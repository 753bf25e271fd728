// libs/lab-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
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

use crate::models::{CreateLabOrderRequest, LabError, LabOrderStatus, RecordResultRequest};
use crate::services::workflow::LabWorkflowService;

#[derive(Debug, Deserialize)]
pub struct LabStatusUpdateRequest {
    pub status: LabOrderStatus,
}

fn map_lab_error(err: LabError) -> AppError {
    match err {
        LabError::NotFound => AppError::NotFound("Lab order not found".to_string()),
        LabError::PaymentRequired { outstanding } => {
            AppError::PaymentRequired(
                format!("Payment of {:.2} is still outstanding on this order's bill", outstanding)
            )
        },
        LabError::BillNotLinked => {
            AppError::PaymentRequired("No bill is linked to this lab order yet".to_string())
        },
        LabError::InvalidStatusTransition(status) => {
            AppError::BadRequest(format!("Lab order cannot move from {} to the requested status", status))
        },
        LabError::ValidationError(msg) => AppError::BadRequest(msg),
        LabError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Place a lab order (doctor).
#[axum::debug_handler]
pub async fn create_lab_order(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateLabOrderRequest>,
) -> Result<Json<Value>, AppError> {
    match user.role.as_deref() {
        Some("doctor") | Some("admin") => {},
        _ => return Err(AppError::Auth("Only a doctor can order lab tests".to_string())),
    }

    let workflow_service = LabWorkflowService::new(&state);

    let order = workflow_service
        .create_order(request, &ctx, auth.token())
        .await
        .map_err(map_lab_error)?;

    Ok(Json(json!({
        "success": true,
        "lab_order": order,
    })))
}

#[axum::debug_handler]
pub async fn get_lab_order(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(ctx): Extension<RequestContext>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let workflow_service = LabWorkflowService::new(&state);

    let order = workflow_service
        .get_order(order_id, &ctx, auth.token())
        .await
        .map_err(map_lab_error)?;

    Ok(Json(json!({ "lab_order": order })))
}

/// Advance the lab workflow one step. Unpaid bills answer 402 and leave the
/// order untouched.
#[axum::debug_handler]
pub async fn update_lab_order_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<LabStatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    require_lab_staff(&user)?;
    let workflow_service = LabWorkflowService::new(&state);

    let order = workflow_service
        .advance(order_id, request.status, &ctx, auth.token())
        .await
        .map_err(map_lab_error)?;

    Ok(Json(json!({
        "success": true,
        "lab_order": order,
    })))
}

/// Enter the test result, completing the order.
#[axum::debug_handler]
pub async fn record_lab_result(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<RecordResultRequest>,
) -> Result<Json<Value>, AppError> {
    require_lab_staff(&user)?;
    let workflow_service = LabWorkflowService::new(&state);

    let order = workflow_service
        .record_result(order_id, request, &ctx, auth.token())
        .await
        .map_err(map_lab_error)?;

    Ok(Json(json!({
        "success": true,
        "lab_order": order,
    })))
}

fn require_lab_staff(user: &User) -> Result<(), AppError> {
    match user.role.as_deref() {
        Some("lab_technician") | Some("doctor") | Some("admin") => Ok(()),
        _ => Err(AppError::Auth("Not authorized to manage lab orders".to_string())),
    }
}
