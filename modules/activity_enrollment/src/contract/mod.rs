//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::EnrollmentApi;
pub use error::EnrollmentError;
pub use model::{
    Activity, ActivityCategory, ActivityFilter, ActivityLevel, ActivityPatch, ActivityStatus,
    AttendanceRecord, AttendanceSummary, AuditAction, AuditEntry, AuditQuery, AuditSubject,
    NewActivity, Participation, ParticipationStatus, ReviewDecision, RosterSnapshot, Schedule,
    TimeRange,
};
