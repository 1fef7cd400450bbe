use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn messaging_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/send", post(send_message))
        .route("/thread", get(get_thread))
        .route("/conversations/{user_id}", get(get_conversations))
        .route("/unread/{user_id}", get(get_unread_count))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
