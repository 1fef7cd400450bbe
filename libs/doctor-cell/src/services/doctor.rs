use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{rest_path, SupabaseClient};
use shared_utils::password::hash_password;

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorRecord, DoctorSummary, UpdateDoctorRequest,
    DOCTOR_ROLE,
};

/// Doctor row with its `patients(count)` aggregate embedded.
#[derive(Debug, Deserialize)]
struct DoctorWithPatients {
    #[serde(flatten)]
    record: DoctorRecord,
    #[serde(default)]
    patients: Vec<PatientTally>,
}

#[derive(Debug, Deserialize)]
struct PatientTally {
    count: usize,
}

impl DoctorWithPatients {
    fn patient_count(&self) -> usize {
        self.patients.first().map_or(0, |tally| tally.count)
    }
}

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create a doctor account. Email uniqueness is checked up front and
    /// enforced again by the table's unique index.
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        let name = request.name.trim();
        let email = request.email.trim();
        debug!("Creating doctor account for: {}", email);

        if name.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(DoctorError::Validation("name, email and password are required".to_string()));
        }

        if self.find_by_email(email).await?.is_some() {
            return Err(DoctorError::EmailTaken);
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| DoctorError::Hashing(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let doctor_data = json!({
            "name": name,
            "email": email,
            "password_hash": password_hash,
            "role": DOCTOR_ROLE,
            "specialty": request.specialty.as_deref().map(str::trim).unwrap_or_default(),
            "phone": request.phone.as_deref().map(str::trim).unwrap_or_default(),
            "created_at": now,
            "updated_at": now
        });

        let record: DoctorRecord = self.supabase.insert("doctors", doctor_data).await?;
        info!("Doctor account created with ID: {}", record.id);

        Ok(record.to_public())
    }

    /// Every doctor with the number of patients assigned to them.
    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, DoctorError> {
        debug!("Listing doctors with patient counts");

        let doctors: Vec<DoctorWithPatients> = self.supabase
            .select_all(&rest_path(
                "doctors",
                "select=*,patients(count)&role=eq.doctor&order=created_at.asc,id.asc",
            ))
            .await?;

        Ok(doctors
            .into_iter()
            .map(|doctor| {
                let patient_count = doctor.patient_count();
                let record = doctor.record;
                DoctorSummary {
                    patient_count,
                    id: record.id,
                    name: record.name,
                    email: record.email,
                    specialty: record.specialty,
                    phone: record.phone,
                }
            })
            .collect())
    }

    /// Raw record by id, any role. `None` for unknown or malformed ids.
    pub async fn find_record(&self, doctor_id: &str) -> Result<Option<DoctorRecord>, DoctorError> {
        let Ok(id) = Uuid::parse_str(doctor_id.trim()) else {
            return Ok(None);
        };

        Ok(self.supabase
            .select_one(&rest_path("doctors", &format!("id=eq.{}", id)))
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<DoctorRecord>, DoctorError> {
        Ok(self.supabase
            .select_one(&rest_path(
                "doctors",
                &format!("email=eq.{}", urlencoding::encode(email.trim())),
            ))
            .await?)
    }

    /// Doctor by id; accounts without the doctor role count as missing.
    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        self.find_record(doctor_id)
            .await?
            .filter(DoctorRecord::is_doctor)
            .map(|record| record.to_public())
            .ok_or(DoctorError::NotFound)
    }

    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let current = self.find_record(doctor_id)
            .await?
            .filter(DoctorRecord::is_doctor)
            .ok_or(DoctorError::NotFound)?;

        let mut update_data = Map::new();

        if let Some(email) = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            if email != current.email {
                let taken = self.find_by_email(email)
                    .await?
                    .is_some_and(|other| other.id != current.id);
                if taken {
                    return Err(DoctorError::EmailTaken);
                }
                update_data.insert("email".to_string(), json!(email));
            }
        }

        if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            update_data.insert("name".to_string(), json!(name));
        }

        let text_fields = [
            ("specialty", &request.specialty),
            ("phone", &request.phone),
            ("qualification", &request.qualification),
            ("experience", &request.experience),
            ("hospital", &request.hospital),
            ("location", &request.location),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                update_data.insert(column.to_string(), json!(value.trim()));
            }
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated: Vec<DoctorRecord> = self.supabase
            .update(&rest_path("doctors", &format!("id=eq.{}", current.id)), Value::Object(update_data))
            .await?;

        let record = updated.into_iter().next().ok_or(DoctorError::NotFound)?;
        info!("Doctor profile {} updated", record.id);

        Ok(record.to_public())
    }

    /// Replaces a stored credential, used when a legacy password is upgraded.
    pub async fn replace_password_hash(&self, doctor_id: Uuid, password_hash: &str) -> Result<(), DoctorError> {
        let _: Vec<Value> = self.supabase
            .update(
                &rest_path("doctors", &format!("id=eq.{}", doctor_id)),
                json!({ "password_hash": password_hash, "updated_at": Utc::now().to_rfc3339() }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_patient_count() {
        let row = json!({
            "id": "5b0d7c56-7a3e-4a4b-9f45-2b8e7f1c9a10",
            "name": "Dr. Meera Iyer",
            "email": "meera@clinic.test",
            "patients": [{ "count": 1500 }]
        });
        let doctor: DoctorWithPatients = serde_json::from_value(row).unwrap();
        assert_eq!(doctor.patient_count(), 1500);
        assert_eq!(doctor.record.name, "Dr. Meera Iyer");

        let bare: DoctorWithPatients = serde_json::from_value(json!({
            "id": "5b0d7c56-7a3e-4a4b-9f45-2b8e7f1c9a10",
            "name": "Dr. Meera Iyer",
            "email": "meera@clinic.test"
        }))
        .unwrap();
        assert_eq!(bare.patient_count(), 0);
    }
}
