//! Capacity ledger
//!
//! Seat arithmetic on an `Activity` that the engine has just read under an
//! optimistic version guard. Every seat change also applies the ACTIVE/FULL
//! side effect so both land in the same commit.

use super::{activity_state, validation};
use crate::contract::{Activity, ActivityStatus, EnrollmentError, Participation};

/// How an activity currently admits new applications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Seats may be taken (directly or after review)
    Open,
    /// FULL with a waitlist: applications become waitlisted PENDING records
    Waitlist,
    /// No applications accepted
    Closed,
}

pub fn admission(activity: &Activity) -> Admission {
    match activity.status {
        ActivityStatus::Active => Admission::Open,
        ActivityStatus::Full if activity.allow_waitlist => Admission::Waitlist,
        _ => Admission::Closed,
    }
}

/// Take one seat, failing rather than exceeding `max_participants`
pub fn reserve_seat(activity: &mut Activity) -> Result<(), EnrollmentError> {
    if activity.is_at_capacity() {
        return Err(EnrollmentError::CapacityExceeded {
            activity_id: activity.id,
            max_participants: activity.max_participants,
        });
    }
    activity.current_participants += 1;
    activity.status = activity_state::after_seat_change(
        activity.status,
        activity.current_participants,
        activity.max_participants,
    );
    Ok(())
}

/// Give one seat back
pub fn release_seat(activity: &mut Activity) -> Result<(), EnrollmentError> {
    if activity.current_participants == 0 {
        return Err(EnrollmentError::Internal {
            message: format!("activity {} has no seat to release", activity.id),
        });
    }
    activity.current_participants -= 1;
    activity.status = activity_state::after_seat_change(
        activity.status,
        activity.current_participants,
        activity.max_participants,
    );
    Ok(())
}

/// Change `max_participants`; never below the seats already taken
pub fn resize(activity: &mut Activity, max_participants: u32) -> Result<(), EnrollmentError> {
    validation::validate_max_participants(max_participants)?;
    if max_participants < activity.current_participants {
        return Err(EnrollmentError::CapacityExceeded {
            activity_id: activity.id,
            max_participants,
        });
    }
    activity.max_participants = max_participants;
    activity.status = activity_state::after_seat_change(
        activity.status,
        activity.current_participants,
        activity.max_participants,
    );
    Ok(())
}

/// Number of seat-holding participations
pub fn seat_holders<'a>(participations: impl IntoIterator<Item = &'a Participation>) -> u32 {
    participations
        .into_iter()
        .filter(|p| p.status.holds_seat())
        .count() as u32
}

/// Whether the stored counter agrees with the participation records
pub fn is_consistent(activity: &Activity, participations: &[Participation]) -> bool {
    let holders = seat_holders(participations.iter().filter(|p| p.activity_id == activity.id));
    activity.current_participants == holders && holders <= activity.max_participants
}
