// libs/triage-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn triage_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/queue", get(handlers::get_triage_queue))
        .route("/vitals", post(handlers::record_vitals))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
