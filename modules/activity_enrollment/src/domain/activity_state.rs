//! Activity lifecycle state machine
//!
//! ```text
//! DRAFT  -> ACTIVE | CANCELLED
//! ACTIVE -> FULL | CLOSED | CANCELLED | COMPLETED
//! FULL   -> ACTIVE | CLOSED | CANCELLED | COMPLETED
//! CLOSED -> COMPLETED | CANCELLED
//! ```
//!
//! ACTIVE <-> FULL is driven by the capacity ledger only.

use crate::contract::{ActivityStatus, EnrollmentError};

/// Whether `from -> to` is in the transition table
pub fn is_allowed(from: ActivityStatus, to: ActivityStatus) -> bool {
    use ActivityStatus::*;
    matches!(
        (from, to),
        (Draft, Active)
            | (Draft, Cancelled)
            | (Active, Full)
            | (Active, Closed)
            | (Active, Cancelled)
            | (Active, Completed)
            | (Full, Active)
            | (Full, Closed)
            | (Full, Cancelled)
            | (Full, Completed)
            | (Closed, Completed)
            | (Closed, Cancelled)
    )
}

/// ACTIVE <-> FULL edges, applied as side effects of seat changes
pub fn is_capacity_driven(from: ActivityStatus, to: ActivityStatus) -> bool {
    use ActivityStatus::*;
    matches!((from, to), (Active, Full) | (Full, Active))
}

pub fn is_terminal(status: ActivityStatus) -> bool {
    matches!(status, ActivityStatus::Completed | ActivityStatus::Cancelled)
}

/// Validate a caller-initiated transition
pub fn request(from: ActivityStatus, to: ActivityStatus) -> Result<ActivityStatus, EnrollmentError> {
    if is_allowed(from, to) && !is_capacity_driven(from, to) {
        Ok(to)
    } else {
        Err(invalid(from, to))
    }
}

/// Publishing is only defined for drafts
pub fn publish(from: ActivityStatus) -> Result<ActivityStatus, EnrollmentError> {
    match from {
        ActivityStatus::Draft => Ok(ActivityStatus::Active),
        other => Err(invalid(other, ActivityStatus::Active)),
    }
}

/// Status after the seat count changed; only ACTIVE and FULL react
pub fn after_seat_change(status: ActivityStatus, current: u32, max: u32) -> ActivityStatus {
    match status {
        ActivityStatus::Active if current >= max => ActivityStatus::Full,
        ActivityStatus::Full if current < max => ActivityStatus::Active,
        other => other,
    }
}

pub(crate) fn invalid(from: ActivityStatus, to: ActivityStatus) -> EnrollmentError {
    EnrollmentError::InvalidTransition {
        entity: "activity",
        from: from.to_string(),
        to: to.to_string(),
    }
}
