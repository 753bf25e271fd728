use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use auth_cell::router::auth_routes;
use lab_cell::router::lab_routes;
use patient_cell::router::patient_routes;
use scheduling_cell::router::appointment_routes;
use triage_cell::router::triage_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Meridian HMS API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/triage", triage_routes(state.clone()))
        .nest("/lab-orders", lab_routes(state.clone()))
}
