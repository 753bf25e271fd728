pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

// Re-export the types other cells build on
pub use models::{
    Appointment, AppointmentStatus, BookAppointmentRequest,
    RecurrenceFrequency, ScheduleError, SlotAvailability, SlotTime,
};
