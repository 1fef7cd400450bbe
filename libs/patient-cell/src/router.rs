use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn patient_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_patient))
        .route("/{patient_id}", get(get_patient).put(update_patient))
        .route("/by-email/{email}", get(get_patient_by_email))
        .route("/doctor/{doctor_id}", get(list_doctor_patients))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}

pub fn pregnancy_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/development/{week}", get(get_baby_development))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
