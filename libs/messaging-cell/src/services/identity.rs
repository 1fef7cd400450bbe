use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{rest_path, DbError, SupabaseClient};
use shared_models::identity::{DoctorProfile, Identity, PatientProfile};

const PATIENT_FIELDS: &str = "select=id,name,email";
const DOCTOR_FIELDS: &str = "select=id,name,email,role,specialty";

/// Resolves ids against both account tables.
pub struct IdentityResolver {
    supabase: SupabaseClient,
}

impl IdentityResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn resolve(&self, id: Uuid) -> Result<Option<Identity>, DbError> {
        let patient_path = rest_path("patients", &format!("{}&id=eq.{}", PATIENT_FIELDS, id));
        let doctor_path = rest_path("doctors", &format!("{}&id=eq.{}", DOCTOR_FIELDS, id));

        let (patient, doctor) = tokio::try_join!(
            self.supabase.select_one::<PatientProfile>(&patient_path),
            self.supabase.select_one::<DoctorProfile>(&doctor_path),
        )?;

        Ok(Identity::from_lookups(patient, doctor))
    }

    pub async fn resolve_many(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Identity>, DbError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        debug!("Resolving {} identities", ids.len());

        let id_list = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let patient_path = rest_path("patients", &format!("{}&id=in.({})", PATIENT_FIELDS, id_list));
        let doctor_path = rest_path("doctors", &format!("{}&id=in.({})", DOCTOR_FIELDS, id_list));

        let (patients, doctors) = tokio::try_join!(
            self.supabase.select::<PatientProfile>(&patient_path),
            self.supabase.select::<DoctorProfile>(&doctor_path),
        )?;

        let mut identities: HashMap<Uuid, Identity> = doctors
            .into_iter()
            .map(|doctor| (doctor.id, Identity::Doctor(doctor)))
            .collect();
        // Patients overwrite doctors holding the same id.
        identities.extend(patients.into_iter().map(|patient| (patient.id, Identity::Patient(patient))));

        Ok(identities)
    }
}
