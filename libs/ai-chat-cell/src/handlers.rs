use std::sync::Arc;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_utils::access::ensure_self_or_admin;
use shared_utils::limits::page_limit;

use crate::models::{
    parse_session_id, AiChatError, ChatRequest, CreateSessionRequest, HistoryQuery,
    RenameSessionRequest, SessionsQuery,
};
use crate::services::{ChatService, ModelCache, SessionStore};

pub const MODEL_HEADER: &str = "x-gemini-model";

/// Passes blank ids through so the service reports them as missing.
fn ensure_owner(user: &SessionUser, user_id: &str) -> Result<(), AppError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        Ok(())
    } else {
        ensure_self_or_admin(user, user_id)
    }
}

#[axum::debug_handler]
pub async fn chat(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Extension(models): Extension<ModelCache>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    ensure_owner(&user, &request.user_id)?;

    let service = ChatService::new(&config, models)?;
    let reply = service.chat(&request).await?;

    Ok((
        [(MODEL_HEADER, reply.model.clone())],
        Json(json!({
            "reply": reply.reply,
            "model": reply.model
        })),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn get_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_owner(&user, &query.user_id)?;
    let session_id = parse_session_id(&query.session_id)?;

    let store = SessionStore::new(&config);
    let messages = store
        .history(&query.user_id, session_id, page_limit(query.limit.as_deref()))
        .await?;

    Ok(Json(json!({ "messages": messages })))
}

#[axum::debug_handler]
pub async fn list_sessions(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_owner(&user, &query.user_id)?;

    let store = SessionStore::new(&config);
    let sessions = store
        .list(&query.user_id, page_limit(query.limit.as_deref()))
        .await?;

    Ok(Json(json!({ "sessions": sessions })))
}

#[axum::debug_handler]
pub async fn create_session(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_owner(&user, &request.user_id)?;

    let store = SessionStore::new(&config);
    let session = store.create(&request.user_id, request.title.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(json!({ "session": session }))))
}

#[axum::debug_handler]
pub async fn rename_session(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(session_id): Path<String>,
    Json(request): Json<RenameSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let store = SessionStore::new(&config);

    let existing = store.find(session_id).await?.ok_or(AiChatError::SessionNotFound)?;
    ensure_self_or_admin(&user, &existing.user_id)?;

    let session = store.rename(session_id, request.title.as_deref()).await?;
    Ok(Json(json!({ "session": session })))
}

#[axum::debug_handler]
pub async fn delete_session(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let store = SessionStore::new(&config);

    // Deleting an unknown session is a no-op.
    if let Some(existing) = store.find(session_id).await? {
        ensure_self_or_admin(&user, &existing.user_id)?;
        store.delete(session_id).await?;
    }

    Ok(Json(json!({ "success": true })))
}
