use chrono::NaiveDate;

use crate::models::{Appointment, AppointmentStatus, AppointmentView};

impl AppointmentView {
    pub fn matches(&self, appointment: &Appointment, today: NaiveDate) -> bool {
        match self {
            AppointmentView::Pending => appointment.status == AppointmentStatus::Pending,
            AppointmentView::Today => {
                appointment.status == AppointmentStatus::Approved && appointment.date == today
            }
            AppointmentView::Upcoming => {
                appointment.status == AppointmentStatus::Approved && appointment.date > today
            }
        }
    }
}

/// Keeps the order of `appointments`.
pub fn apply_view(appointments: Vec<Appointment>, view: AppointmentView, today: NaiveDate) -> Vec<Appointment> {
    appointments
        .into_iter()
        .filter(|appointment| view.matches(appointment, today))
        .collect()
}
