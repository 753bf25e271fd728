use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/validate", post(handlers::validate_token))
        .route("/verify", post(handlers::verify_token))
        .route("/profile", get(handlers::get_profile))
        .with_state(state)
}
