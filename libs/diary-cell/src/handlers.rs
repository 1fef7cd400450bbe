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

use crate::models::{DiaryQuery, UpsertDiaryRequest};
use crate::services::DiaryService;

#[axum::debug_handler]
pub async fn get_diary_entry(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<DiaryQuery>,
) -> Result<Json<Value>, AppError> {
    if !query.user_id.trim().is_empty() {
        ensure_self_or_admin(&user, query.user_id.trim())?;
    }

    let service = DiaryService::new(&config);
    let entry = service.get_entry(&query.user_id, &query.date).await?;

    Ok(Json(json!({ "entry": entry })))
}

#[axum::debug_handler]
pub async fn upsert_diary_entry(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpsertDiaryRequest>,
) -> Result<Json<Value>, AppError> {
    if !request.user_id.trim().is_empty() {
        ensure_self_or_admin(&user, request.user_id.trim())?;
    }

    let service = DiaryService::new(&config);
    let entry = service.upsert_entry(request).await?;

    Ok(Json(json!({ "entry": entry })))
}
