use std::sync::Arc;
use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_utils::access::ensure_self_or_admin;
use shared_utils::limits::page_limit;

use crate::models::{ListNotificationsQuery, NotificationError, RefreshRequest};
use crate::services::NotificationService;

#[axum::debug_handler]
pub async fn refresh_notifications(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(NotificationError::MissingUserId.into());
    }
    ensure_self_or_admin(&user, user_id)?;

    let service = NotificationService::new(&config)?;
    let refreshed = service.refresh(user_id, &request.city).await?;

    Ok(Json(json!({
        "success": true,
        "city": refreshed.city,
        "summary": refreshed.summary,
        "notifications": refreshed.notifications
    })))
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(NotificationError::MissingUserId.into());
    }
    ensure_self_or_admin(&user, user_id)?;

    let service = NotificationService::new(&config)?;
    let notifications = service
        .list(user_id, query.city.as_deref(), page_limit(query.limit.as_deref()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "notifications": notifications
    })))
}

pub async fn list_resources(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&config)?;
    let resources = service.resources().await;

    Ok(Json(json!({
        "success": true,
        "resources": resources
    })))
}
