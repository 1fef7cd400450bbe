use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{rest_path, SupabaseClient};
use shared_utils::dates::{format_date, gestational_week, normalize_date, today};
use shared_utils::password::hash_password;

use doctor_cell::DoctorService;

use crate::models::{
    parse_age, CreatePatientRequest, Patient, PatientError, PatientRecord, RiskStatus,
    UpdatePatientRequest,
};

const WITH_DOCTOR: &str = "select=*,doctor:doctors(name,email,specialty,phone)";

pub struct PatientService {
    supabase: SupabaseClient,
    doctors: DoctorService,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
        }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let name = request.name.trim();
        let email = request.email.trim();
        debug!("Creating patient account for: {}", email);

        let doctor = self.doctors
            .find_record(&request.doctor_id)
            .await?
            .filter(|doctor| doctor.is_doctor())
            .ok_or(PatientError::NotADoctor)?;

        if name.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(PatientError::Validation("name, email and password are required".to_string()));
        }

        let start = request.pregnancy_start_date
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| PatientError::Validation("pregnancyStartDate is required".to_string()))?;
        let start = normalize_date(start)
            .ok_or_else(|| PatientError::Validation("Invalid pregnancyStartDate".to_string()))?;

        if self.find_by_email(email).await?.is_some() {
            return Err(PatientError::EmailTaken);
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| PatientError::Hashing(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let patient_data = json!({
            "name": name,
            "email": email,
            "password_hash": password_hash,
            "age": request.age.as_ref().and_then(parse_age),
            "pregnancy_start_date": format_date(start),
            "gestational_week": gestational_week(start, today()),
            "contact_phone": request.phone.as_deref().map(str::trim).unwrap_or_default(),
            "medical_notes": request.notes.as_deref().map(str::trim).unwrap_or_default(),
            "risk_status": RiskStatus::Normal,
            "doctor_id": doctor.id,
            "created_at": now,
            "updated_at": now
        });

        let record: PatientRecord = self.supabase.insert("patients", patient_data).await?;
        info!("Patient {} created by doctor {}", record.id, doctor.id);

        Ok(record.to_public())
    }

    /// Raw record by id without the embedded doctor.
    pub async fn find_record(&self, patient_id: &str) -> Result<Option<PatientRecord>, PatientError> {
        let Ok(id) = Uuid::parse_str(patient_id.trim()) else {
            return Ok(None);
        };

        Ok(self.supabase
            .select_one(&rest_path("patients", &format!("id=eq.{}", id)))
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<PatientRecord>, PatientError> {
        Ok(self.supabase
            .select_one(&rest_path(
                "patients",
                &format!("email=eq.{}", urlencoding::encode(email.trim())),
            ))
            .await?)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, PatientError> {
        debug!("Fetching patient: {}", patient_id);

        let id = Uuid::parse_str(patient_id.trim()).map_err(|_| PatientError::NotFound)?;
        let record: Option<PatientRecord> = self.supabase
            .select_one(&rest_path("patients", &format!("{}&id=eq.{}", WITH_DOCTOR, id)))
            .await?;

        record.map(|r| r.to_public()).ok_or(PatientError::NotFound)
    }

    pub async fn get_patient_by_email(&self, email: &str) -> Result<Patient, PatientError> {
        debug!("Fetching patient by email: {}", email);

        let record: Option<PatientRecord> = self.supabase
            .select_one(&rest_path(
                "patients",
                &format!("{}&email=eq.{}", WITH_DOCTOR, urlencoding::encode(email.trim())),
            ))
            .await?;

        record.map(|r| r.to_public()).ok_or(PatientError::NotFound)
    }

    pub async fn list_by_doctor(&self, doctor_id: &str) -> Result<Vec<Patient>, PatientError> {
        debug!("Listing patients of doctor: {}", doctor_id);

        let Ok(id) = Uuid::parse_str(doctor_id.trim()) else {
            return Ok(Vec::new());
        };

        let records: Vec<PatientRecord> = self.supabase
            .select(&rest_path("patients", &format!("doctor_id=eq.{}&order=created_at.desc", id)))
            .await?;

        Ok(records.iter().map(PatientRecord::to_public).collect())
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient: {}", patient_id);

        let current = self.find_record(patient_id).await?.ok_or(PatientError::NotFound)?;
        let update_data = self.build_update(&current, request).await?;

        let updated: Vec<Value> = self.supabase
            .update(&rest_path("patients", &format!("id=eq.{}", current.id)), Value::Object(update_data))
            .await?;

        if updated.is_empty() {
            return Err(PatientError::NotFound);
        }
        info!("Patient {} updated", current.id);

        self.get_patient(&current.id.to_string()).await
    }

    async fn build_update(
        &self,
        current: &PatientRecord,
        request: UpdatePatientRequest,
    ) -> Result<Map<String, Value>, PatientError> {
        let mut update_data = Map::new();

        if let Some(email) = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            if email != current.email {
                let taken = self.find_by_email(email)
                    .await?
                    .is_some_and(|other| other.id != current.id);
                if taken {
                    return Err(PatientError::EmailTaken);
                }
                update_data.insert("email".to_string(), json!(email));
            }
        }

        if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            update_data.insert("name".to_string(), json!(name));
        }

        if let Some(age) = request.age.as_ref().and_then(parse_age) {
            update_data.insert("age".to_string(), json!(age));
        }

        let text_fields = [
            ("contact_phone", &request.contact_phone),
            ("husband_name", &request.husband_name),
            ("husband_phone", &request.husband_phone),
            ("medical_notes", &request.medical_notes),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                update_data.insert(column.to_string(), json!(value.trim()));
            }
        }

        if let Some(raw) = request.risk_status.as_deref() {
            let status: RiskStatus = raw.parse()?;
            update_data.insert("risk_status".to_string(), json!(status));
        }

        // Unparseable dates leave the stored start date untouched.
        if let Some(start) = request.pregnancy_start_date.as_deref().and_then(normalize_date) {
            update_data.insert("pregnancy_start_date".to_string(), json!(format_date(start)));
            update_data.insert("gestational_week".to_string(), json!(gestational_week(start, today())));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        Ok(update_data)
    }

    /// Replaces a stored credential, used when a legacy password is upgraded.
    pub async fn replace_password_hash(&self, patient_id: Uuid, password_hash: &str) -> Result<(), PatientError> {
        let _: Vec<Value> = self.supabase
            .update(
                &rest_path("patients", &format!("id=eq.{}", patient_id)),
                json!({ "password_hash": password_hash, "updated_at": Utc::now().to_rfc3339() }),
            )
            .await?;
        Ok(())
    }
}
