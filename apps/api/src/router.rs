use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use ai_chat_cell::router::ai_chat_routes;
use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use diary_cell::router::diary_routes;
use doctor_cell::router::doctor_routes;
use messaging_cell::router::messaging_routes;
use notification_cell::router::notification_routes;
use patient_cell::router::{patient_routes, pregnancy_routes};
use shared_config::AppConfig;

/// Diary images travel inline as base64.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

async fn liveness() -> Json<Value> {
    Json(json!({ "success": true, "message": "MomCare API is running" }))
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/pregnancy", pregnancy_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/messages", messaging_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/diary", diary_routes(state.clone()))
        .nest("/ai", ai_chat_routes(state));

    Router::new()
        .route("/", get(liveness))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;
    use shared_utils::test_utils::TestConfig;

    #[tokio::test]
    async fn test_liveness_is_public() {
        let app = create_router(TestConfig::default().to_arc());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cell_routes_require_session() {
        let app = create_router(TestConfig::default().to_arc());
        let request = Request::builder()
            .uri("/api/diary?userId=u1&date=2025-03-10")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
