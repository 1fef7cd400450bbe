pub mod development;
pub mod patient;

pub use patient::PatientService;
