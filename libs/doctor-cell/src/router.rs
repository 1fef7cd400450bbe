use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_doctor).get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor).put(handlers::update_doctor))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
