use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Outcome of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The appointment already has the requested status.
    Unchanged,
    Apply,
}

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Transition, AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status {
            return Ok(Transition::Unchanged);
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(Transition::Apply)
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[AppointmentStatus::Approved, AppointmentStatus::Rejected],
            AppointmentStatus::Approved => &[AppointmentStatus::Completed],
            // Terminal
            AppointmentStatus::Rejected | AppointmentStatus::Completed => &[],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
