//! Participation lifecycle state machine
//!
//! ```text
//! PENDING  -> APPROVED | REJECTED
//! APPROVED -> WITHDRAWN | COMPLETED
//! ```
//!
//! REJECTED, WITHDRAWN and COMPLETED are terminal for the record; a new
//! application creates a new record.

use crate::contract::{EnrollmentError, ParticipationStatus, ReviewDecision};

pub fn is_allowed(from: ParticipationStatus, to: ParticipationStatus) -> bool {
    use ParticipationStatus::*;
    matches!(
        (from, to),
        (Pending, Approved) | (Pending, Rejected) | (Approved, Withdrawn) | (Approved, Completed)
    )
}

pub fn is_terminal(status: ParticipationStatus) -> bool {
    use ParticipationStatus::*;
    matches!(status, Rejected | Withdrawn | Completed)
}

pub fn transition(
    from: ParticipationStatus,
    to: ParticipationStatus,
) -> Result<ParticipationStatus, EnrollmentError> {
    if is_allowed(from, to) {
        Ok(to)
    } else {
        Err(EnrollmentError::InvalidTransition {
            entity: "participation",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Initial status of a fresh application
pub fn initial(requires_approval: bool, waitlisted: bool) -> ParticipationStatus {
    if requires_approval || waitlisted {
        ParticipationStatus::Pending
    } else {
        ParticipationStatus::Approved
    }
}

/// Status a review decision leads to
pub fn review_target(decision: ReviewDecision) -> ParticipationStatus {
    match decision {
        ReviewDecision::Approve => ParticipationStatus::Approved,
        ReviewDecision::Reject => ParticipationStatus::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ParticipationStatus::*;

    #[test]
    fn test_transition_table() {
        let allowed = [
            (Pending, Approved),
            (Pending, Rejected),
            (Approved, Withdrawn),
            (Approved, Completed),
        ];
        for from in ParticipationStatus::all() {
            for to in ParticipationStatus::all() {
                assert_eq!(
                    is_allowed(*from, *to),
                    allowed.contains(&(*from, *to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_review_of_approved_is_invalid() {
        let err = transition(Approved, review_target(ReviewDecision::Approve)).unwrap_err();
        assert!(matches!(
            err,
            EnrollmentError::InvalidTransition { entity: "participation", .. }
        ));
    }

    #[test]
    fn test_pending_cannot_withdraw() {
        assert!(transition(Pending, Withdrawn).is_err());
        assert!(is_terminal(Withdrawn));
        assert!(!is_terminal(Approved));
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(initial(true, false), Pending);
        assert_eq!(initial(false, false), Approved);
        assert_eq!(initial(false, true), Pending);
    }
}
