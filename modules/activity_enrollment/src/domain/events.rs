//! Domain events for the enrollment engine
//!
//! Every committed mutation produces exactly one event. The event is stored as
//! the `details` payload of its audit entry, which is what the notification
//! collaborator consumes:
//! - `participation_reviewed`, `student_withdrew`, `activity_status_changed`
//!   fan out to guardians
//! - everything else is audit-only

use crate::contract::model::{Activity, AuditAction, AuditEntry, Participation};
use crate::contract::EnrollmentError;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event types for enrollment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EnrollmentEvent {
    ActivityCreated(ActivityCreatedEvent),
    ActivityUpdated(ActivityUpdatedEvent),
    ActivityStatusChanged(ActivityStatusChangedEvent),
    ActivityDeleted(ActivityDeletedEvent),
    StudentApplied(StudentAppliedEvent),
    ParticipationReviewed(ParticipationReviewedEvent),
    StudentWithdrew(StudentWithdrewEvent),
    ParticipationCompleted(ParticipationCompletedEvent),
    AttendanceRecorded(AttendanceRecordedEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCreatedEvent {
    pub activity_id: Uuid,
    pub title: String,
    pub max_participants: u32,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityUpdatedEvent {
    pub activity_id: Uuid,
    /// Names of the fields the patch changed
    pub changed_fields: Vec<String>,
    pub max_participants: u32,
    pub current_participants: u32,
    pub status_from: String,
    pub status_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStatusChangedEvent {
    pub activity_id: Uuid,
    pub from: String,
    pub to: String,
    /// `published` for DRAFT -> ACTIVE via publish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDeletedEvent {
    pub activity_id: Uuid,
    pub title: String,
    /// Participations removed by the cascade
    pub removed_participations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAppliedEvent {
    pub activity_id: Uuid,
    pub participation_id: Uuid,
    pub student_id: Uuid,
    pub status: String,
    pub waitlisted: bool,
    pub current_participants: u32,
    pub activity_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationReviewedEvent {
    pub activity_id: Uuid,
    pub participation_id: Uuid,
    pub student_id: Uuid,
    pub decision: String,
    pub status: String,
    pub current_participants: u32,
    pub max_participants: u32,
    pub activity_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentWithdrewEvent {
    pub activity_id: Uuid,
    pub participation_id: Uuid,
    pub student_id: Uuid,
    pub current_participants: u32,
    pub activity_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationCompletedEvent {
    pub activity_id: Uuid,
    pub participation_id: Uuid,
    pub student_id: Uuid,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecordedEvent {
    pub activity_id: Uuid,
    pub participation_id: Uuid,
    pub date: NaiveDate,
    pub present: bool,
    pub excused: bool,
    /// Whether an earlier record for the same date was overwritten
    pub replaced: bool,
}

impl EnrollmentEvent {
    pub fn activity_created(activity: &Activity) -> Self {
        Self::ActivityCreated(ActivityCreatedEvent {
            activity_id: activity.id,
            title: activity.title.clone(),
            max_participants: activity.max_participants,
            status: activity.status.to_string(),
        })
    }

    pub fn activity_status_changed(activity: &Activity, from: &str, reason: Option<&str>) -> Self {
        Self::ActivityStatusChanged(ActivityStatusChangedEvent {
            activity_id: activity.id,
            from: from.to_string(),
            to: activity.status.to_string(),
            reason: reason.map(str::to_string),
        })
    }

    pub fn student_applied(activity: &Activity, participation: &Participation) -> Self {
        Self::StudentApplied(StudentAppliedEvent {
            activity_id: activity.id,
            participation_id: participation.id,
            student_id: participation.student_id,
            status: participation.status.to_string(),
            waitlisted: participation.waitlisted,
            current_participants: activity.current_participants,
            activity_status: activity.status.to_string(),
        })
    }

    pub fn participation_reviewed(
        activity: &Activity,
        participation: &Participation,
        decision: &str,
    ) -> Self {
        Self::ParticipationReviewed(ParticipationReviewedEvent {
            activity_id: activity.id,
            participation_id: participation.id,
            student_id: participation.student_id,
            decision: decision.to_string(),
            status: participation.status.to_string(),
            current_participants: activity.current_participants,
            max_participants: activity.max_participants,
            activity_status: activity.status.to_string(),
            note: participation.review_note.clone(),
        })
    }

    pub fn student_withdrew(activity: &Activity, participation: &Participation) -> Self {
        Self::StudentWithdrew(StudentWithdrewEvent {
            activity_id: activity.id,
            participation_id: participation.id,
            student_id: participation.student_id,
            current_participants: activity.current_participants,
            activity_status: activity.status.to_string(),
        })
    }

    pub fn participation_completed(participation: &Participation) -> Self {
        Self::ParticipationCompleted(ParticipationCompletedEvent {
            activity_id: participation.activity_id,
            participation_id: participation.id,
            student_id: participation.student_id,
            score: participation.participation_score,
        })
    }

    /// Audit tag for this event
    pub fn action(&self) -> AuditAction {
        match self {
            Self::ActivityCreated(_) => AuditAction::ActivityCreated,
            Self::ActivityUpdated(_) => AuditAction::ActivityUpdated,
            Self::ActivityStatusChanged(_) => AuditAction::ActivityStatusChanged,
            Self::ActivityDeleted(_) => AuditAction::ActivityDeleted,
            Self::StudentApplied(_) => AuditAction::StudentApplied,
            Self::ParticipationReviewed(_) => AuditAction::ParticipationReviewed,
            Self::StudentWithdrew(_) => AuditAction::StudentWithdrew,
            Self::ParticipationCompleted(_) => AuditAction::ParticipationCompleted,
            Self::AttendanceRecorded(_) => AuditAction::AttendanceRecorded,
        }
    }

    /// Build the audit entry describing this event.
    ///
    /// Serialization failure surfaces as `AuditWriteFailed` so the mutation
    /// is never committed without its record.
    pub fn into_audit_entry(
        self,
        performed_by: Uuid,
        target_id: Uuid,
        school_id: Uuid,
    ) -> Result<AuditEntry, EnrollmentError> {
        let action = self.action();
        let details =
            serde_json::to_value(&self).map_err(|e| EnrollmentError::AuditWriteFailed {
                reason: format!("cannot encode {} details: {}", action, e),
            })?;

        Ok(AuditEntry {
            id: Uuid::new_v4(),
            action,
            performed_by,
            target_id,
            school_id,
            details,
            timestamp: Utc::now(),
        })
    }

    /// Decode an event back out of an audit entry's details
    pub fn from_details(details: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(details.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_details_are_tagged() {
        let event = EnrollmentEvent::ActivityDeleted(ActivityDeletedEvent {
            activity_id: Uuid::new_v4(),
            title: "Robotics".to_string(),
            removed_participations: 3,
        });
        let entry = event
            .clone()
            .into_audit_entry(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .expect("event should encode");

        assert_eq!(entry.action, AuditAction::ActivityDeleted);
        assert_eq!(entry.details["event_type"], "activity_deleted");
        assert_eq!(entry.details["removed_participations"], 3);
        assert_eq!(EnrollmentEvent::from_details(&entry.details), Some(event));
    }

    #[test]
    fn test_optional_reason_is_omitted() {
        let event = EnrollmentEvent::ActivityStatusChanged(ActivityStatusChangedEvent {
            activity_id: Uuid::new_v4(),
            from: "active".to_string(),
            to: "closed".to_string(),
            reason: None,
        });
        let value = serde_json::to_value(&event).expect("event should encode");
        assert!(value.get("reason").is_none());
        assert_eq!(event.action(), AuditAction::ActivityStatusChanged);
        assert!(event.action().is_notifiable());
    }

    #[test]
    fn test_attendance_event_encodes_date() {
        let event = EnrollmentEvent::AttendanceRecorded(AttendanceRecordedEvent {
            activity_id: Uuid::new_v4(),
            participation_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
            present: false,
            excused: true,
            replaced: true,
        });
        let value = serde_json::to_value(&event).expect("event should encode");
        assert_eq!(value["date"], "2024-03-01");
        assert!(!event.action().is_notifiable());
    }
}
