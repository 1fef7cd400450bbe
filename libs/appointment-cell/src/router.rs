use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/patient/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_appointments))
        .route("/{appointment_id}/status", put(handlers::update_appointment_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
