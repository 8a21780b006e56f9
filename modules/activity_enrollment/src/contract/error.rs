//! Contract error types for the enrollment engine
//!
//! These errors are transport-agnostic and used for inter-module communication.
//! Every variant is a distinct, machine-checkable kind; on any of them the
//! engine has left activities, participations and the audit log untouched.

use uuid::Uuid;

/// Enrollment engine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentError {
    /// Referenced activity or participation does not exist
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (activity, participation)
        resource: &'static str,
        id: Uuid,
    },

    /// Requested state change is not in the transition table
    #[error("invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        /// State machine name (activity, participation)
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Approval or application would exceed `max_participants`
    #[error("activity {activity_id} is at capacity ({max_participants} participants)")]
    CapacityExceeded {
        activity_id: Uuid,
        max_participants: u32,
    },

    /// Student already has a PENDING or APPROVED participation
    #[error("student {student_id} already participates in activity {activity_id}")]
    AlreadyParticipating { activity_id: Uuid, student_id: Uuid },

    /// Activity status does not admit applications
    #[error("activity {activity_id} is not accepting applications (status: {status})")]
    ActivityNotAcceptingApplications { activity_id: Uuid, status: String },

    /// Attendance recorded against a participation that is not APPROVED
    #[error("participation {participation_id} is not approved (status: {status})")]
    ParticipationNotApproved {
        participation_id: Uuid,
        status: String,
    },

    /// Compliance log could not be written; the state change was rolled back
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// Optimistic-concurrency retries exhausted
    #[error("concurrent modification of {target_id} after {attempts} attempts")]
    ConcurrencyConflict { target_id: Uuid, attempts: u32 },

    /// Input rejected before touching state
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Transient persistence failure
    #[error("storage error: {message}")]
    Storage { message: String },

    /// Stored state violates an engine invariant
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl EnrollmentError {
    /// Whether the caller may retry the whole operation unchanged
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. } | Self::Storage { .. })
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::AlreadyParticipating { .. } => "already_participating",
            Self::ActivityNotAcceptingApplications { .. } => "activity_not_accepting_applications",
            Self::ParticipationNotApproved { .. } => "participation_not_approved",
            Self::AuditWriteFailed { .. } => "audit_write_failed",
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Validation { .. } => "validation",
            Self::Storage { .. } => "storage",
            Self::Internal { .. } => "internal",
        }
    }

    pub(crate) fn activity_not_found(id: Uuid) -> Self {
        Self::NotFound {
            resource: "activity",
            id,
        }
    }

    pub(crate) fn participation_not_found(id: Uuid) -> Self {
        Self::NotFound {
            resource: "participation",
            id,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
