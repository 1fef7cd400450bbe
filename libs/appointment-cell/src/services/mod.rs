pub mod booking;
pub mod lifecycle;
pub mod views;

pub use booking::AppointmentBookingService;
pub use lifecycle::{AppointmentLifecycleService, Transition};
