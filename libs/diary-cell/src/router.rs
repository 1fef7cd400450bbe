use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn diary_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(get_diary_entry))
        .route("/upsert", post(upsert_diary_entry))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
