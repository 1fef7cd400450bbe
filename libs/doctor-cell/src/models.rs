use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shared_database::DbError;
use shared_models::error::AppError;
use shared_models::identity::DoctorProfile;

pub const DOCTOR_ROLE: &str = "doctor";

fn default_role() -> String {
    DOCTOR_ROLE.to_string()
}

/// Row of the `doctors` table, credential included. Never serialized
/// into responses; convert with [`DoctorRecord::to_public`].
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub hospital: String,
    #[serde(default)]
    pub location: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DoctorRecord {
    pub fn is_doctor(&self) -> bool {
        self.role == DOCTOR_ROLE
    }

    pub fn to_public(&self) -> Doctor {
        Doctor {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            specialty: self.specialty.clone(),
            phone: self.phone.clone(),
            qualification: self.qualification.clone(),
            experience: self.experience.clone(),
            hospital: self.hospital.clone(),
            location: self.location.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn profile(&self) -> DoctorProfile {
        DoctorProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            specialty: Some(self.specialty.clone()).filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub specialty: String,
    pub phone: String,
    pub qualification: String,
    pub experience: String,
    pub hospital: String,
    pub location: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Admin listing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub phone: String,
    pub patient_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub specialty: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub hospital: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Email already in use")]
    EmailTaken,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::EmailTaken => AppError::Conflict(err.to_string()),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::Database(DbError::UniqueViolation(_)) => {
                AppError::Conflict(DoctorError::EmailTaken.to_string())
            }
            DoctorError::Hashing(_) | DoctorError::Database(_) => AppError::Internal(err.to_string()),
        }
    }
}
