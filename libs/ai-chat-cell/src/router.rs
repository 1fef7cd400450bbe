use std::sync::Arc;
use axum::{
    middleware,
    routing::{get, patch, post},
    Extension, Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;
use crate::services::ModelCache;

pub fn ai_chat_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/history", get(get_history))
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{session_id}", patch(rename_session).delete(delete_session))
        .layer(Extension(ModelCache::default()))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
