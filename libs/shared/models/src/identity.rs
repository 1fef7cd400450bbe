use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public profile of a patient as seen by other identities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Public profile of a doctor-table account (role doctor or admin).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub specialty: Option<String>,
}

/// Any account an id can refer to.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Patient(PatientProfile),
    Doctor(DoctorProfile),
}

impl Identity {
    pub fn id(&self) -> Uuid {
        match self {
            Identity::Patient(p) => p.id,
            Identity::Doctor(d) => d.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Identity::Patient(p) => &p.name,
            Identity::Doctor(d) => &d.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::Patient(p) => &p.email,
            Identity::Doctor(d) => &d.email,
        }
    }

    pub fn role(&self) -> &str {
        match self {
            Identity::Patient(_) => "patient",
            Identity::Doctor(d) => &d.role,
        }
    }

    /// A patient record wins when both tables hold the id.
    pub fn from_lookups(patient: Option<PatientProfile>, doctor: Option<DoctorProfile>) -> Option<Self> {
        match (patient, doctor) {
            (Some(p), _) => Some(Identity::Patient(p)),
            (None, Some(d)) => Some(Identity::Doctor(d)),
            (None, None) => None,
        }
    }
}
