//! Contract models for the enrollment engine
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use super::error::EnrollmentError;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares `as_str`, `Display` and `FromStr` for a closed set of string tags.
macro_rules! string_tags {
    ($name:ident, $kind:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $name {
            /// Stable lowercase tag used in storage, audit details and DTOs
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }

            /// Every variant, in declaration order
            pub fn all() -> &'static [Self] {
                &[$(Self::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = EnrollmentError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)+
                    other => Err(EnrollmentError::Validation {
                        message: format!("unknown {} '{}'", $kind, other),
                    }),
                }
            }
        }
    };
}

/// Activity lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityStatus {
    Draft,
    Active,
    Full,
    Closed,
    Completed,
    Cancelled,
}

string_tags!(ActivityStatus, "activity status", {
    Draft => "draft",
    Active => "active",
    Full => "full",
    Closed => "closed",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Activity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityCategory {
    Sports,
    Arts,
    Music,
    Academic,
    Technology,
    Community,
    Other,
}

string_tags!(ActivityCategory, "activity category", {
    Sports => "sports",
    Arts => "arts",
    Music => "music",
    Academic => "academic",
    Technology => "technology",
    Community => "community",
    Other => "other",
});

/// Skill level an activity targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityLevel {
    Beginner,
    Intermediate,
    Advanced,
    AllLevels,
}

string_tags!(ActivityLevel, "activity level", {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
    AllLevels => "all_levels",
});

/// Participation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipationStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
    Completed,
}

string_tags!(ParticipationStatus, "participation status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Withdrawn => "withdrawn",
    Completed => "completed",
});

impl ParticipationStatus {
    /// PENDING and APPROVED block a second application for the same pair
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// Statuses counted by `Activity::current_participants`
    pub fn holds_seat(&self) -> bool {
        matches!(self, Self::Approved | Self::Completed)
    }
}

/// Outcome chosen by a reviewer for a pending application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

string_tags!(ReviewDecision, "review decision", {
    Approve => "approve",
    Reject => "reject",
});

/// Opaque schedule metadata; the engine stores it but never interprets it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub meeting_days: Vec<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub frequency: Option<String>,
    pub location: Option<String>,
}

/// Extracurricular activity with a bounded number of seats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: Uuid,
    /// Tenant that owns the activity
    pub school_id: Uuid,
    /// Teacher who created the activity
    pub teacher_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub level: ActivityLevel,
    pub status: ActivityStatus,
    pub max_participants: u32,
    /// Seat-holding participations; written only by the engine
    pub current_participants: u32,
    pub requires_approval: bool,
    pub allow_waitlist: bool,
    pub is_public: bool,
    pub schedule: Schedule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every committed write
    pub version: i64,
}

impl Activity {
    /// Seats still free
    pub fn available_seats(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }

    pub fn is_at_capacity(&self) -> bool {
        self.current_participants >= self.max_participants
    }
}

/// Input for creating an activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub school_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub level: ActivityLevel,
    pub max_participants: u32,
    pub requires_approval: bool,
    pub allow_waitlist: bool,
    pub is_public: bool,
    pub schedule: Schedule,
}

/// Partial update of activity details; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ActivityCategory>,
    pub level: Option<ActivityLevel>,
    pub max_participants: Option<u32>,
    pub requires_approval: Option<bool>,
    pub allow_waitlist: Option<bool>,
    pub is_public: Option<bool>,
    pub schedule: Option<Schedule>,
}

/// Filter for listing activities of a school
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub status: Option<ActivityStatus>,
    pub category: Option<ActivityCategory>,
    pub public_only: bool,
}

impl ActivityFilter {
    pub fn matches(&self, activity: &Activity) -> bool {
        self.status.map_or(true, |s| activity.status == s)
            && self.category.map_or(true, |c| activity.category == c)
            && (!self.public_only || activity.is_public)
    }
}

/// Attendance fact for one session date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub present: bool,
    /// Only meaningful when `present` is false
    pub excused: bool,
    pub note: Option<String>,
}

/// One student's application/membership in one activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participation {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub student_id: Uuid,
    pub school_id: Uuid,
    pub status: ParticipationStatus,
    /// Created as PENDING while the activity was FULL
    pub waitlisted: bool,
    pub application_date: DateTime<Utc>,
    pub application_message: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
    /// Ordered by date, at most one record per date
    pub attendance: Vec<AttendanceRecord>,
    pub participation_score: Option<u8>,
    pub feedback: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Participation {
    pub fn attendance_on(&self, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.attendance.iter().find(|r| r.date == date)
    }
}

/// Per-date attendance aggregate across an activity's approved participants
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSummary {
    pub activity_id: Uuid,
    pub date: NaiveDate,
    pub present: u32,
    pub excused: u32,
    /// Unexcused absences, including participants with no record for the date
    pub absent: u32,
    /// `present / (present + excused + absent)`, 0 when there is nobody to count
    pub rate: f64,
}

impl AttendanceSummary {
    pub fn total(&self) -> u32 {
        self.present + self.excused + self.absent
    }
}

/// Capacity snapshot computed on read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub activity_id: Uuid,
    pub status: ActivityStatus,
    pub max_participants: u32,
    pub current_participants: u32,
    pub available_seats: u32,
    pub pending: u32,
    pub waitlisted: u32,
}

/// Audit action tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    ActivityCreated,
    ActivityUpdated,
    ActivityStatusChanged,
    ActivityDeleted,
    StudentApplied,
    ParticipationReviewed,
    StudentWithdrew,
    ParticipationCompleted,
    AttendanceRecorded,
}

string_tags!(AuditAction, "audit action", {
    ActivityCreated => "activity_created",
    ActivityUpdated => "activity_updated",
    ActivityStatusChanged => "activity_status_changed",
    ActivityDeleted => "activity_deleted",
    StudentApplied => "student_applied",
    ParticipationReviewed => "participation_reviewed",
    StudentWithdrew => "student_withdrew",
    ParticipationCompleted => "participation_completed",
    AttendanceRecorded => "attendance_recorded",
});

impl AuditAction {
    /// Actions the guardian notification collaborator subscribes to
    pub fn is_notifiable(&self) -> bool {
        matches!(
            self,
            Self::ParticipationReviewed | Self::StudentWithdrew | Self::ActivityStatusChanged
        )
    }
}

/// Immutable record of one committed mutation
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub performed_by: Uuid,
    /// Activity or participation id
    pub target_id: Uuid,
    pub school_id: Uuid,
    /// Action-specific payload
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// What an audit query is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSubject {
    Target(Uuid),
    School(Uuid),
    Actor(Uuid),
}

impl AuditSubject {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        match self {
            Self::Target(id) => entry.target_id == *id,
            Self::School(id) => entry.school_id == *id,
            Self::Actor(id) => entry.performed_by == *id,
        }
    }
}

/// Half-open time window `[from, until)`; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.until.map_or(true, |until| ts < until)
    }
}

/// Read-only audit lookup used by reporting collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditQuery {
    pub subject: AuditSubject,
    pub range: TimeRange,
    pub limit: Option<u64>,
}

impl AuditQuery {
    pub fn for_target(target_id: Uuid) -> Self {
        Self {
            subject: AuditSubject::Target(target_id),
            range: TimeRange::default(),
            limit: None,
        }
    }

    pub fn for_school(school_id: Uuid) -> Self {
        Self {
            subject: AuditSubject::School(school_id),
            range: TimeRange::default(),
            limit: None,
        }
    }

    pub fn for_actor(actor_id: Uuid) -> Self {
        Self {
            subject: AuditSubject::Actor(actor_id),
            range: TimeRange::default(),
            limit: None,
        }
    }

    pub fn within(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.subject.matches(entry) && self.range.contains(entry.timestamp)
    }
}
