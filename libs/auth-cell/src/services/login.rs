use serde_json::json;
use tracing::{debug, info, warn};

use doctor_cell::DoctorService;
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_models::auth::{Role, SessionUser};
use shared_utils::jwt::issue_token;
use shared_utils::password::{check_password, secrets_match, PasswordCheck};

use crate::models::{AdminUser, AuthError, LoginRequest, LoginResponse};

pub const ADMIN_ID: &str = "admin";

pub struct LoginService<'a> {
    config: &'a AppConfig,
    doctors: DoctorService,
    patients: PatientService,
}

impl<'a> LoginService<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            doctors: DoctorService::new(config),
            patients: PatientService::new(config),
        }
    }

    fn is_admin(&self, request: &LoginRequest) -> bool {
        !self.config.admin_email.is_empty()
            && request.email == self.config.admin_email
            && secrets_match(&request.password, &self.config.admin_password)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        if self.is_admin(&request) {
            info!("Admin login");
            let session = SessionUser {
                id: ADMIN_ID.to_string(),
                email: Some(self.config.admin_email.clone()),
                name: Some("Admin".to_string()),
                role: Role::Admin,
                issued_at: None,
            };
            let user = AdminUser {
                id: ADMIN_ID,
                email: self.config.admin_email.clone(),
                name: "Admin",
            };
            return self.respond(session, json!(user), Some("Admin login successful"));
        }

        match request.role.as_deref().map(str::trim) {
            Some("doctor") => self.login_doctor(&request).await,
            Some("patient") => self.login_patient(&request).await,
            _ => Err(AuthError::InvalidRole),
        }
    }

    async fn login_doctor(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        debug!("Doctor login attempt for: {}", request.email);

        let doctor = self.doctors
            .find_by_email(&request.email)
            .await?
            .filter(|doctor| doctor.is_doctor())
            .ok_or(AuthError::InvalidCredentials(Role::Doctor))?;

        match verify(&request.password, &doctor.password_hash)? {
            PasswordCheck::Valid => {}
            PasswordCheck::ValidLegacy(upgraded) => {
                self.doctors.replace_password_hash(doctor.id, &upgraded).await?;
                info!("Upgraded legacy credential for doctor {}", doctor.id);
            }
            PasswordCheck::Invalid => return Err(AuthError::InvalidCredentials(Role::Doctor)),
        }

        let session = SessionUser {
            id: doctor.id.to_string(),
            email: Some(doctor.email.clone()),
            name: Some(doctor.name.clone()),
            role: Role::Doctor,
            issued_at: None,
        };
        self.respond(session, json!(doctor.to_public()), None)
    }

    async fn login_patient(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        debug!("Patient login attempt for: {}", request.email);

        let patient = self.patients
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials(Role::Patient))?;

        match verify(&request.password, &patient.password_hash)? {
            PasswordCheck::Valid => {}
            PasswordCheck::ValidLegacy(upgraded) => {
                self.patients.replace_password_hash(patient.id, &upgraded).await?;
                info!("Upgraded legacy credential for patient {}", patient.id);
            }
            PasswordCheck::Invalid => return Err(AuthError::InvalidCredentials(Role::Patient)),
        }

        let session = SessionUser {
            id: patient.id.to_string(),
            email: Some(patient.email.clone()),
            name: Some(patient.name.clone()),
            role: Role::Patient,
            issued_at: None,
        };
        self.respond(session, json!(patient.to_public()), None)
    }

    fn respond(
        &self,
        session: SessionUser,
        user: serde_json::Value,
        message: Option<&'static str>,
    ) -> Result<LoginResponse, AuthError> {
        let token = issue_token(&session, &self.config.session_secret, self.config.session_ttl_hours)
            .map_err(AuthError::Token)?;

        Ok(LoginResponse {
            success: true,
            role: session.role,
            user,
            token,
            message,
        })
    }
}

fn verify(password: &str, stored: &str) -> Result<PasswordCheck, AuthError> {
    check_password(password, stored).map_err(|e| {
        warn!("Stored credential could not be parsed: {}", e);
        AuthError::Password(e.to_string())
    })
}
