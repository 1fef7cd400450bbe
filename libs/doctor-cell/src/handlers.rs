use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_utils::access::{ensure_admin, ensure_self_or_admin};

use crate::models::{CreateDoctorRequest, UpdateDoctorRequest};
use crate::services::doctor::DoctorService;

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_admin(&user)?;

    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.create_doctor(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "message": "Doctor created successfully",
        "doctor": doctor
    }))))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let doctor_service = DoctorService::new(&state);
    let doctors = doctor_service.list_doctors().await?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    debug!("User {} fetching doctor {}", user.id, doctor_id);

    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.get_doctor(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    // Only the doctor themselves or an admin can update the profile
    ensure_self_or_admin(&user, &doctor_id)?;

    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.update_doctor(&doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor profile updated successfully",
        "doctor": doctor
    })))
}
