//! Workshop registry domain module.
//!
//! Pure domain logic for the people and vehicles the workshop serves and
//! the appointments that bring them in. No IO, no HTTP, no storage.

pub mod appointment;
pub mod user;
pub mod vehicle;

pub use appointment::{Appointment, AppointmentPatch, AppointmentStatus, NewAppointment};
pub use user::{NewUser, User, UserPatch, UserSummary};
pub use vehicle::{NewVehicle, Vehicle, VehiclePatch, VehicleSummary};
