//! Activity Enrollment Module
//!
//! Capacity-safe enrollment of students into extracurricular activities.
//! Every mutation commits together with exactly one audit entry, and
//! the approved-participant count never exceeds an activity's capacity,
//! including under concurrent applications and approvals.

// Public exports
pub mod contract;
pub use contract::{
    client::EnrollmentApi, error::EnrollmentError, Activity, ActivityStatus, AttendanceRecord,
    AuditEntry, AuditQuery, NewActivity, Participation, ParticipationStatus, ReviewDecision,
};

pub mod module;
pub use module::EnrollmentModule;

pub mod config;
pub use config::Config;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
