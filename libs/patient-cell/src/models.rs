use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

use doctor_cell::DoctorError;
use shared_database::DbError;
use shared_models::error::AppError;
use shared_models::identity::PatientProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskStatus {
    #[default]
    Normal,
    Attention,
    HighRisk,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Normal => "normal",
            RiskStatus::Attention => "attention",
            RiskStatus::HighRisk => "high-risk",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskStatus {
    type Err = PatientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "normal" => Ok(RiskStatus::Normal),
            "attention" => Ok(RiskStatus::Attention),
            "high-risk" => Ok(RiskStatus::HighRisk),
            other => Err(PatientError::Validation(format!("Invalid risk status: {}", other))),
        }
    }
}

/// Contact details of the assigned doctor, embedded on reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Row of the `patients` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
    pub age: Option<i32>,
    pub pregnancy_start_date: NaiveDate,
    pub gestational_week: Option<i32>,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub husband_name: String,
    #[serde(default)]
    pub husband_phone: String,
    #[serde(default)]
    pub medical_notes: String,
    #[serde(default)]
    pub risk_status: RiskStatus,
    pub doctor_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub doctor: Option<DoctorContact>,
}

impl PatientRecord {
    pub fn to_public(&self) -> Patient {
        Patient {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: "patient",
            age: self.age,
            pregnancy_start_date: self.pregnancy_start_date,
            gestational_week: self.gestational_week,
            contact_phone: self.contact_phone.clone(),
            husband_name: self.husband_name.clone(),
            husband_phone: self.husband_phone.clone(),
            medical_notes: self.medical_notes.clone(),
            risk_status: self.risk_status,
            doctor_id: self.doctor_id,
            doctor: self.doctor.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn profile(&self) -> PatientProfile {
        PatientProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Patient as returned by the API; the credential never leaves the service.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub age: Option<i32>,
    pub pregnancy_start_date: NaiveDate,
    pub gestational_week: Option<i32>,
    pub contact_phone: String,
    pub husband_name: String,
    pub husband_phone: String,
    pub medical_notes: String,
    pub risk_status: RiskStatus,
    pub doctor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorContact>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub doctor_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub pregnancy_start_date: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<Value>,
    pub contact_phone: Option<String>,
    pub husband_name: Option<String>,
    pub husband_phone: Option<String>,
    pub medical_notes: Option<String>,
    pub risk_status: Option<String>,
    pub pregnancy_start_date: Option<String>,
}

/// Accepts a JSON number or a numeric string; anything else is ignored.
pub fn parse_age(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(|v| v as i32),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i32),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Only doctors can create patients")]
    NotADoctor,

    #[error("Email already in use")]
    EmailTaken,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<DoctorError> for PatientError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => PatientError::NotADoctor,
            DoctorError::Database(db) => PatientError::Database(db),
            other => PatientError::Validation(other.to_string()),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::NotADoctor => AppError::Forbidden(err.to_string()),
            PatientError::EmailTaken => AppError::Conflict(err.to_string()),
            PatientError::Validation(msg) => AppError::ValidationError(msg),
            PatientError::Database(DbError::UniqueViolation(_)) => {
                AppError::Conflict(PatientError::EmailTaken.to_string())
            }
            PatientError::Hashing(_) | PatientError::Database(_) => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_risk_status_wire_format() {
        assert_eq!(serde_json::to_value(RiskStatus::HighRisk).unwrap(), json!("high-risk"));
        assert_eq!("attention".parse::<RiskStatus>().unwrap(), RiskStatus::Attention);
        assert!("critical".parse::<RiskStatus>().is_err());
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age(&json!(29)), Some(29));
        assert_eq!(parse_age(&json!("31")), Some(31));
        assert_eq!(parse_age(&json!("thirty")), None);
        assert_eq!(parse_age(&json!(null)), None);
        assert_eq!(parse_age(&json!("")), None);
    }
}
