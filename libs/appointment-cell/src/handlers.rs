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

use crate::models::{
    AppointmentError, AppointmentView, CreateAppointmentRequest, ListAppointmentsQuery,
    UpdateStatusRequest,
};
use crate::services::AppointmentBookingService;

fn parse_view(query: &ListAppointmentsQuery) -> Result<Option<AppointmentView>, AppointmentError> {
    query.view
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(str::parse)
        .transpose()
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AppointmentBookingService::new(&config);
    let appointment = service.create_appointment(&user, request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "message": "Appointment request sent",
        "appointment": appointment
    }))))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(patient_id): Path<String>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let view = parse_view(&query)?;

    let service = AppointmentBookingService::new(&config);
    let appointments = service.list_for_patient(&user, &patient_id, view).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(doctor_id): Path<String>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_self_or_admin(&user, &doctor_id)?;
    let view = parse_view(&query)?;

    let service = AppointmentBookingService::new(&config);
    let appointments = service.list_for_doctor(&doctor_id, view).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<SessionUser>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&config);
    let appointment = service.update_status(&user, &appointment_id, &request.status).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment status updated",
        "appointment": appointment
    })))
}
