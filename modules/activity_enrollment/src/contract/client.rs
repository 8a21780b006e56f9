//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to interact with the
//! enrollment engine. NO HTTP - direct function calls for performance.
//! Callers are expected to be authorized already; `actor_id` only feeds the
//! audit trail.

use super::{
    error::EnrollmentError,
    model::{
        Activity, ActivityFilter, ActivityPatch, ActivityStatus, AttendanceRecord,
        AttendanceSummary, AuditEntry, AuditQuery, NewActivity, Participation,
        ParticipationStatus, ReviewDecision, RosterSnapshot,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Enrollment API for inter-module communication
#[async_trait]
pub trait EnrollmentApi: Send + Sync {
    // ===== Activity Operations =====

    /// Create a DRAFT activity owned by `teacher_id`
    async fn create_activity(
        &self,
        teacher_id: Uuid,
        input: NewActivity,
    ) -> Result<Activity, EnrollmentError>;

    /// Edit activity details and capacity
    async fn update_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
        patch: ActivityPatch,
    ) -> Result<Activity, EnrollmentError>;

    /// DRAFT -> ACTIVE
    async fn publish_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Activity, EnrollmentError>;

    /// Caller-initiated lifecycle transition
    async fn set_activity_status(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
        new_status: ActivityStatus,
    ) -> Result<Activity, EnrollmentError>;

    /// Delete an activity and its participations; returns how many were removed
    async fn delete_activity(&self, activity_id: Uuid, actor_id: Uuid)
        -> Result<usize, EnrollmentError>;

    async fn get_activity(&self, activity_id: Uuid) -> Result<Activity, EnrollmentError>;

    async fn list_activities(
        &self,
        school_id: Uuid,
        filter: ActivityFilter,
    ) -> Result<Vec<Activity>, EnrollmentError>;

    async fn roster(&self, activity_id: Uuid) -> Result<RosterSnapshot, EnrollmentError>;

    // ===== Participation Operations =====

    /// Apply `student_id` to an activity
    async fn apply(
        &self,
        activity_id: Uuid,
        student_id: Uuid,
        actor_id: Uuid,
        message: Option<String>,
    ) -> Result<Participation, EnrollmentError>;

    /// Approve or reject a PENDING application
    async fn review_application(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        decision: ReviewDecision,
        note: Option<String>,
    ) -> Result<Participation, EnrollmentError>;

    /// APPROVED -> WITHDRAWN, freeing the seat
    async fn withdraw(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Participation, EnrollmentError>;

    /// APPROVED -> COMPLETED with optional score (0-100) and feedback
    async fn complete_participation(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        score: Option<u8>,
        feedback: Option<String>,
    ) -> Result<Participation, EnrollmentError>;

    async fn get_participation(
        &self,
        participation_id: Uuid,
    ) -> Result<Participation, EnrollmentError>;

    async fn list_participations(
        &self,
        activity_id: Uuid,
        status: Option<ParticipationStatus>,
    ) -> Result<Vec<Participation>, EnrollmentError>;

    /// "My activities" for a student
    async fn student_participations(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Participation>, EnrollmentError>;

    async fn waitlist(&self, activity_id: Uuid) -> Result<Vec<Participation>, EnrollmentError>;

    // ===== Attendance Operations =====

    /// Upsert the attendance record for `record.date`
    async fn record_attendance(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        record: AttendanceRecord,
    ) -> Result<Participation, EnrollmentError>;

    async fn attendance_rate(&self, participation_id: Uuid) -> Result<f64, EnrollmentError>;

    async fn activity_attendance_summary(
        &self,
        activity_id: Uuid,
        date: NaiveDate,
    ) -> Result<AttendanceSummary, EnrollmentError>;

    // ===== Audit =====

    async fn query_audit(&self, query: AuditQuery) -> Result<Vec<AuditEntry>, EnrollmentError>;
}
