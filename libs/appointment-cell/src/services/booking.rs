use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::DoctorService;
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::{rest_path, DbError, SupabaseClient};
use shared_models::auth::SessionUser;
use shared_utils::dates::{format_date, normalize_date, today};

use crate::models::{
    Appointment, AppointmentError, AppointmentRecord, AppointmentStatus, AppointmentView,
    CreateAppointmentRequest, PartyName,
};
use crate::services::lifecycle::{AppointmentLifecycleService, Transition};
use crate::services::views::apply_view;

const WITH_PARTIES: &str = "select=*,patient:patients(name,email),doctor:doctors(name,email,specialty)";
const LIST_ORDER: &str = "order=date.asc,time.asc,created_at.desc";

pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    patients: PatientService,
    doctors: DoctorService,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            patients: PatientService::new(config),
            doctors: DoctorService::new(config),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn create_appointment(
        &self,
        user: &SessionUser,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let patient_id = request.patient_id.trim();
        let time = request.time.trim();
        if patient_id.is_empty() || request.date.trim().is_empty() || time.is_empty() {
            return Err(AppointmentError::Validation("patientId, date and time are required".to_string()));
        }
        debug!("Booking request for patient {} at {} {}", patient_id, request.date, time);

        let patient = self.patients
            .find_record(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        if user.is_patient() && !user.is(&patient.id.to_string()) {
            return Err(AppointmentError::Forbidden("Patients can only book for themselves".to_string()));
        }

        let doctor_id = request.doctor_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .unwrap_or_else(|| patient.doctor_id.to_string());

        let doctor = self.doctors
            .find_record(&doctor_id)
            .await?
            .filter(|doctor| doctor.is_doctor())
            .ok_or(AppointmentError::DoctorNotFound)?;

        if user.is_doctor() && !user.is(&doctor.id.to_string()) {
            return Err(AppointmentError::Forbidden("Doctors can only book into their own schedule".to_string()));
        }

        let date = normalize_date(&request.date)
            .ok_or_else(|| AppointmentError::Validation("Invalid appointment date".to_string()))?;

        if self.slot_taken(doctor.id, date, time).await? {
            return Err(AppointmentError::SlotTaken);
        }

        let now = Utc::now().to_rfc3339();
        let appointment_data = json!({
            "patient_id": patient.id,
            "doctor_id": doctor.id,
            "date": format_date(date),
            "time": time,
            "notes": request.notes.as_deref().map(str::trim).unwrap_or_default(),
            "status": AppointmentStatus::Pending,
            "created_at": now,
            "updated_at": now
        });

        // The partial unique index catches bookings that raced past the pre-check.
        let mut record: AppointmentRecord = self.supabase
            .insert("appointments", appointment_data)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation(_) => AppointmentError::SlotTaken,
                other => AppointmentError::Database(other),
            })?;

        record.patient = Some(PartyName {
            name: patient.name.clone(),
            email: patient.email.clone(),
            specialty: None,
        });
        record.doctor = Some(PartyName {
            name: doctor.name.clone(),
            email: doctor.email.clone(),
            specialty: Some(doctor.specialty.clone()).filter(|s| !s.is_empty()),
        });

        info!("Appointment {} requested for doctor {} on {}", record.id, doctor.id, date);
        Ok(record.to_public())
    }

    async fn slot_taken(&self, doctor_id: Uuid, date: NaiveDate, time: &str) -> Result<bool, AppointmentError> {
        let query = format!(
            "select=id&doctor_id=eq.{}&date=eq.{}&time=eq.{}&status=in.(pending,approved)&limit=1",
            doctor_id,
            format_date(date),
            urlencoding::encode(time),
        );
        let existing: Vec<serde_json::Value> = self.supabase
            .select(&rest_path("appointments", &query))
            .await?;

        Ok(!existing.is_empty())
    }

    pub async fn find_appointment(&self, appointment_id: &str) -> Result<AppointmentRecord, AppointmentError> {
        let id = Uuid::parse_str(appointment_id.trim()).map_err(|_| AppointmentError::NotFound)?;

        self.supabase
            .select_one(&rest_path("appointments", &format!("{}&id=eq.{}", WITH_PARTIES, id)))
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_for_patient(
        &self,
        user: &SessionUser,
        patient_id: &str,
        view: Option<AppointmentView>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments of patient: {}", patient_id);

        let patient = self.patients
            .find_record(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        let allowed = user.is_admin()
            || user.is(&patient.id.to_string())
            || user.is(&patient.doctor_id.to_string());
        if !allowed {
            return Err(AppointmentError::Forbidden("Not allowed to view these appointments".to_string()));
        }

        self.list_where(&format!("patient_id=eq.{}", patient.id), view).await
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: &str,
        view: Option<AppointmentView>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments of doctor: {}", doctor_id);

        let Ok(id) = Uuid::parse_str(doctor_id.trim()) else {
            return Ok(Vec::new());
        };

        self.list_where(&format!("doctor_id=eq.{}", id), view).await
    }

    async fn list_where(
        &self,
        filter: &str,
        view: Option<AppointmentView>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let records: Vec<AppointmentRecord> = self.supabase
            .select(&rest_path("appointments", &format!("{}&{}&{}", WITH_PARTIES, filter, LIST_ORDER)))
            .await?;

        let appointments: Vec<Appointment> = records.iter().map(AppointmentRecord::to_public).collect();
        Ok(match view {
            Some(view) => apply_view(appointments, view, today()),
            None => appointments,
        })
    }

    pub async fn update_status(
        &self,
        user: &SessionUser,
        appointment_id: &str,
        raw_status: &str,
    ) -> Result<Appointment, AppointmentError> {
        let new_status: AppointmentStatus = raw_status.parse()?;
        let current = self.find_appointment(appointment_id).await?;

        if !user.is_admin() && !user.is(&current.doctor_id.to_string()) {
            return Err(AppointmentError::Forbidden(
                "Only the appointment's doctor can change its status".to_string(),
            ));
        }

        if self.lifecycle.validate_status_transition(current.status, new_status)? == Transition::Unchanged {
            debug!("Appointment {} already {}", current.id, new_status);
            return Ok(current.to_public());
        }

        // Compare-and-set on the status we read.
        let path = rest_path(
            "appointments",
            &format!("id=eq.{}&status=eq.{}&{}", current.id, current.status, WITH_PARTIES),
        );
        let updated: Vec<AppointmentRecord> = self.supabase
            .update(&path, json!({
                "status": new_status,
                "updated_at": Utc::now().to_rfc3339()
            }))
            .await?;

        let Some(record) = updated.into_iter().next() else {
            warn!("Appointment {} changed status concurrently, expected {}", current.id, current.status);
            return Err(AppointmentError::StatusChanged);
        };

        info!("Appointment {} moved from {} to {}", record.id, current.status, record.status);
        Ok(record.to_public())
    }
}
