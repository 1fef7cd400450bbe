use std::sync::Arc;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_utils::access::ensure_self_or_admin;

use crate::models::{SendMessageRequest, ThreadQuery};
use crate::services::MessagingService;

#[axum::debug_handler]
pub async fn send_message(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_self_or_admin(&user, request.sender_id.trim())?;

    let service = MessagingService::new(&config);
    let message = service.send(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "message": message
    }))))
}

#[axum::debug_handler]
pub async fn get_thread(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<ThreadQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_self_or_admin(&user, query.user_id.trim())?;

    let service = MessagingService::new(&config);
    let messages = service.thread(&query.user_id, &query.peer_id).await?;

    Ok(Json(json!({
        "success": true,
        "messages": messages
    })))
}

#[axum::debug_handler]
pub async fn get_conversations(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_self_or_admin(&user, &user_id)?;

    let service = MessagingService::new(&config);
    let conversations = service.conversations(&user_id).await?;

    Ok(Json(json!({
        "success": true,
        "conversations": conversations
    })))
}

#[axum::debug_handler]
pub async fn get_unread_count(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_self_or_admin(&user, &user_id)?;

    let service = MessagingService::new(&config);
    let total_unread = service.unread_count(&user_id).await?;

    Ok(Json(json!({
        "success": true,
        "totalUnread": total_unread
    })))
}
