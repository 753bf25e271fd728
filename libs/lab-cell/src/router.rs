// libs/lab-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn lab_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_lab_order))
        .route("/{order_id}", get(handlers::get_lab_order))
        .route("/{order_id}/status", patch(handlers::update_lab_order_status))
        .route("/{order_id}/result", post(handlers::record_lab_result))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
