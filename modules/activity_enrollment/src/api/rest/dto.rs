//! REST DTOs with serde derives for HTTP API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ===== Activity DTOs =====

/// Opaque schedule metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ScheduleDto {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[schema(example = json!(["monday", "wednesday"]))]
    pub meeting_days: Vec<String>,
    #[schema(example = "15:30")]
    pub start_time: Option<String>,
    pub duration_minutes: Option<u32>,
    #[schema(example = "weekly")]
    pub frequency: Option<String>,
    pub location: Option<String>,
}

/// Activity response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityDto {
    pub id: Uuid,
    pub school_id: Uuid,
    pub teacher_id: Uuid,
    #[schema(example = "Robotics Club")]
    pub title: String,
    pub description: String,
    #[schema(example = "technology")]
    pub category: String,
    #[schema(example = "beginner")]
    pub level: String,
    #[schema(example = "active")]
    pub status: String,
    pub max_participants: u32,
    pub current_participants: u32,
    pub available_seats: u32,
    pub requires_approval: bool,
    pub allow_waitlist: bool,
    pub is_public: bool,
    pub schedule: ScheduleDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Create activity request; the creating teacher is the request actor
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateActivityRequest {
    pub school_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = "sports")]
    pub category: String,
    #[schema(example = "all_levels")]
    pub level: String,
    pub max_participants: u32,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    #[serde(default)]
    pub allow_waitlist: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub schedule: ScheduleDto,
}

fn default_true() -> bool {
    true
}

/// Partial update of activity details
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateActivityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub max_participants: Option<u32>,
    pub requires_approval: Option<bool>,
    pub allow_waitlist: Option<bool>,
    pub is_public: Option<bool>,
    pub schedule: Option<ScheduleDto>,
}

/// Caller-initiated status change
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    #[schema(example = "closed")]
    pub status: String,
}

/// List response for activities
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivitiesListResponse {
    pub items: Vec<ActivityDto>,
    pub total: usize,
}

/// Result of a cascading delete
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteActivityResponse {
    pub activity_id: Uuid,
    pub removed_participations: usize,
}

/// Capacity snapshot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RosterDto {
    pub activity_id: Uuid,
    pub status: String,
    pub max_participants: u32,
    pub current_participants: u32,
    pub available_seats: u32,
    pub pending: u32,
    pub waitlisted: u32,
}

// ===== Participation DTOs =====

/// Attendance fact for one date
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecordDto {
    pub date: NaiveDate,
    pub present: bool,
    pub excused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Participation response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipationDto {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub student_id: Uuid,
    pub school_id: Uuid,
    #[schema(example = "pending")]
    pub status: String,
    pub waitlisted: bool,
    pub application_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    pub attendance: Vec<AttendanceRecordDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// List response for participations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipationsListResponse {
    pub items: Vec<ParticipationDto>,
    pub total: usize,
}

/// Application request; the applying actor may differ from the student
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApplyRequest {
    pub student_id: Uuid,
    #[serde(default)]
    pub message: Option<String>,
}

/// Review decision for a pending application
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewRequest {
    #[schema(example = "approve")]
    pub decision: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CompleteRequest {
    pub score: Option<u8>,
    pub feedback: Option<String>,
}

// ===== Attendance DTOs =====

/// Attendance for the date given in the path
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordAttendanceRequest {
    pub present: bool,
    #[serde(default)]
    pub excused: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRateDto {
    pub participation_id: Uuid,
    pub rate: f64,
}

/// Per-date aggregate across approved participants
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummaryDto {
    pub activity_id: Uuid,
    pub date: NaiveDate,
    pub present: u32,
    pub excused: u32,
    pub absent: u32,
    pub total: u32,
    pub rate: f64,
}

// ===== Audit DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntryDto {
    pub id: Uuid,
    #[schema(example = "participation_reviewed")]
    pub action: String,
    pub performed_by: Uuid,
    pub target_id: Uuid,
    pub school_id: Uuid,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntryDto>,
    pub total: usize,
}
