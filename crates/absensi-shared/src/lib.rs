//! # absensi-shared
//!
//! Core domain types, pure validators, and tuning constants shared by every
//! crate in the attendance workflow.

pub mod constants;
pub mod types;
pub mod validate;

pub use types::{
    AttendanceDraft, Facilitator, GeoFix, Location, RegistrationState, SessionKind, SoreReport,
};
