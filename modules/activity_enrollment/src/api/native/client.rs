//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    Activity, ActivityFilter, ActivityPatch, ActivityStatus, AttendanceRecord, AttendanceSummary,
    AuditEntry, AuditQuery, EnrollmentApi, EnrollmentError, NewActivity, Participation,
    ParticipationStatus, ReviewDecision, RosterSnapshot,
};
use crate::domain::Service;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EnrollmentApi for NativeClient {
    async fn create_activity(
        &self,
        teacher_id: Uuid,
        input: NewActivity,
    ) -> Result<Activity, EnrollmentError> {
        self.service.create_activity(teacher_id, input).await
    }

    async fn update_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
        patch: ActivityPatch,
    ) -> Result<Activity, EnrollmentError> {
        self.service
            .update_activity(activity_id, actor_id, patch)
            .await
    }

    async fn publish_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Activity, EnrollmentError> {
        self.service.publish_activity(activity_id, actor_id).await
    }

    async fn set_activity_status(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
        new_status: ActivityStatus,
    ) -> Result<Activity, EnrollmentError> {
        self.service
            .set_activity_status(activity_id, actor_id, new_status)
            .await
    }

    async fn delete_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
    ) -> Result<usize, EnrollmentError> {
        self.service.delete_activity(activity_id, actor_id).await
    }

    async fn get_activity(&self, activity_id: Uuid) -> Result<Activity, EnrollmentError> {
        self.service.get_activity(activity_id).await
    }

    async fn list_activities(
        &self,
        school_id: Uuid,
        filter: ActivityFilter,
    ) -> Result<Vec<Activity>, EnrollmentError> {
        self.service.list_activities(school_id, filter).await
    }

    async fn roster(&self, activity_id: Uuid) -> Result<RosterSnapshot, EnrollmentError> {
        self.service.roster(activity_id).await
    }

    async fn apply(
        &self,
        activity_id: Uuid,
        student_id: Uuid,
        actor_id: Uuid,
        message: Option<String>,
    ) -> Result<Participation, EnrollmentError> {
        self.service
            .apply(activity_id, student_id, actor_id, message)
            .await
    }

    async fn review_application(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        decision: ReviewDecision,
        note: Option<String>,
    ) -> Result<Participation, EnrollmentError> {
        self.service
            .review_application(participation_id, actor_id, decision, note)
            .await
    }

    async fn withdraw(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Participation, EnrollmentError> {
        self.service.withdraw(participation_id, actor_id).await
    }

    async fn complete_participation(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        score: Option<u8>,
        feedback: Option<String>,
    ) -> Result<Participation, EnrollmentError> {
        self.service
            .complete_participation(participation_id, actor_id, score, feedback)
            .await
    }

    async fn get_participation(
        &self,
        participation_id: Uuid,
    ) -> Result<Participation, EnrollmentError> {
        self.service.get_participation(participation_id).await
    }

    async fn list_participations(
        &self,
        activity_id: Uuid,
        status: Option<ParticipationStatus>,
    ) -> Result<Vec<Participation>, EnrollmentError> {
        self.service.list_participations(activity_id, status).await
    }

    async fn student_participations(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Participation>, EnrollmentError> {
        self.service.student_participations(student_id).await
    }

    async fn waitlist(&self, activity_id: Uuid) -> Result<Vec<Participation>, EnrollmentError> {
        self.service.waitlist(activity_id).await
    }

    async fn record_attendance(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        record: AttendanceRecord,
    ) -> Result<Participation, EnrollmentError> {
        self.service
            .record_attendance(participation_id, actor_id, record)
            .await
    }

    async fn attendance_rate(&self, participation_id: Uuid) -> Result<f64, EnrollmentError> {
        self.service.attendance_rate(participation_id).await
    }

    async fn activity_attendance_summary(
        &self,
        activity_id: Uuid,
        date: NaiveDate,
    ) -> Result<AttendanceSummary, EnrollmentError> {
        self.service
            .activity_attendance_summary(activity_id, date)
            .await
    }

    async fn query_audit(&self, query: AuditQuery) -> Result<Vec<AuditEntry>, EnrollmentError> {
        self.service.query_audit(query).await
    }
}
