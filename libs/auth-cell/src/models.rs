use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use doctor_cell::DoctorError;
use patient_cell::PatientError;
use shared_models::auth::Role;
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: &'static str,
    pub email: String,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub role: Role,
    pub user: Value,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid role selected")]
    InvalidRole,

    #[error("Invalid {0} credentials")]
    InvalidCredentials(Role),

    #[error("Password verification failed: {0}")]
    Password(String),

    #[error("Session signing failed: {0}")]
    Token(String),

    #[error("Account lookup failed: {0}")]
    Lookup(String),
}

impl From<DoctorError> for AuthError {
    fn from(err: DoctorError) -> Self {
        AuthError::Lookup(err.to_string())
    }
}

impl From<PatientError> for AuthError {
    fn from(err: PatientError) -> Self {
        AuthError::Lookup(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidRole => AppError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials(_) => AppError::Auth(err.to_string()),
            AuthError::Password(_) | AuthError::Token(_) | AuthError::Lookup(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
