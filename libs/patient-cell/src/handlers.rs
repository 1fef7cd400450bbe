use std::sync::Arc;
use axum::{
    extract::{Path, State, Extension},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;
use shared_utils::access::{ensure_role, ensure_self_or_admin};

use crate::models::{CreatePatientRequest, Patient, UpdatePatientRequest};
use crate::services::development::{development_for_week, parse_week};
use crate::services::PatientService;

/// The patient, their assigned doctor, or an admin.
fn ensure_can_access(user: &SessionUser, patient: &Patient) -> Result<(), AppError> {
    if user.is_admin() || user.is(&patient.id.to_string()) || user.is(&patient.doctor_id.to_string()) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not allowed to access this patient".to_string()))
    }
}

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_role(&user, &[Role::Doctor, Role::Admin])?;
    ensure_self_or_admin(&user, &request.doctor_id)?;

    let service = PatientService::new(&config);
    let patient = service.create_patient(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "message": "Patient created successfully",
        "patient": patient
    }))))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let patient = service.get_patient(&patient_id).await?;
    ensure_can_access(&user, &patient)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient
    })))
}

#[axum::debug_handler]
pub async fn get_patient_by_email(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let patient = service.get_patient_by_email(&email).await?;
    ensure_can_access(&user, &patient)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient
    })))
}

#[axum::debug_handler]
pub async fn list_doctor_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_self_or_admin(&user, &doctor_id)?;

    let service = PatientService::new(&config);
    let patients = service.list_by_doctor(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "patients": patients
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let existing = service.get_patient(&patient_id).await?;
    ensure_can_access(&user, &existing)?;

    let patient = service.update_patient(&patient_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "patient": patient
    })))
}

pub async fn get_baby_development(
    Path(week): Path<String>,
) -> Result<Json<Value>, AppError> {
    let info = development_for_week(parse_week(&week));

    Ok(Json(json!({
        "success": true,
        "week": info.week,
        "summary": info.summary,
        "highlights": info.highlights
    })))
}
