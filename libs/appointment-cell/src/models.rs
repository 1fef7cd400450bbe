use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::DoctorError;
use patient_cell::PatientError;
use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Approved => "approved",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "pending" => Ok(AppointmentStatus::Pending),
            "approved" => Ok(AppointmentStatus::Approved),
            "rejected" => Ok(AppointmentStatus::Rejected),
            "completed" => Ok(AppointmentStatus::Completed),
            _ => Err(AppointmentError::InvalidStatus),
        }
    }
}

/// Derived list views over a set of appointments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentView {
    Pending,
    Today,
    Upcoming,
}

impl FromStr for AppointmentView {
    type Err = AppointmentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "pending" => Ok(AppointmentView::Pending),
            "today" => Ok(AppointmentView::Today),
            "upcoming" => Ok(AppointmentView::Upcoming),
            other => Err(AppointmentError::Validation(format!("Unknown view: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PartyName {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// Row of the `appointments` table with the patient and doctor embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub notes: String,
    pub status: AppointmentStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub patient: Option<PartyName>,
    #[serde(default)]
    pub doctor: Option<PartyName>,
}

impl AppointmentRecord {
    pub fn to_public(&self) -> Appointment {
        let name_of = |party: &Option<PartyName>| {
            party.as_ref().map(|p| p.name.clone()).unwrap_or_default()
        };

        Appointment {
            id: self.id,
            patient_id: self.patient_id,
            patient_name: name_of(&self.patient),
            doctor_id: self.doctor_id,
            doctor_name: name_of(&self.doctor),
            doctor_specialty: self.doctor.as_ref().and_then(|d| d.specialty.clone()),
            date: self.date,
            time: self.time.clone(),
            notes: self.notes.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_specialty: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub notes: String,
    pub status: AppointmentStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub patient_id: String,
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAppointmentsQuery {
    pub view: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("This slot is already requested or booked")]
    SlotTaken,

    #[error("Invalid status")]
    InvalidStatus,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment status was changed by another request")]
    StatusChanged,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<PatientError> for AppointmentError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppointmentError::PatientNotFound,
            PatientError::Database(db) => AppointmentError::Database(db),
            other => AppointmentError::Validation(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppointmentError::DoctorNotFound,
            DoctorError::Database(db) => AppointmentError::Database(db),
            other => AppointmentError::Validation(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::DoctorNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SlotTaken | AppointmentError::StatusChanged => AppError::Conflict(err.to_string()),
            AppointmentError::Database(DbError::UniqueViolation(_)) => {
                AppError::Conflict(AppointmentError::SlotTaken.to_string())
            }
            AppointmentError::InvalidStatus | AppointmentError::InvalidTransition { .. } => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Database(_) => AppError::Database(err.to_string()),
        }
    }
}
