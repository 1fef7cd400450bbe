use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

/// Both routes authenticate on their own: login issues the session,
/// verify inspects one.
pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/verify", get(handlers::verify_session))
        .with_state(state)
}
