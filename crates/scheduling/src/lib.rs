//! Appointments with clients (document hand-over, notary visits, interpreting).

pub mod appointment;

pub use appointment::{Appointment, AppointmentState, Calendar, NewAppointment};
