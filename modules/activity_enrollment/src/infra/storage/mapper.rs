//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use super::entity::{activity, audit_log, participation};
use crate::contract::{Activity, AttendanceRecord, AuditEntry, Participation, Schedule};
use anyhow::Context;
use chrono::NaiveDate;
use sea_orm::ActiveValue::{NotSet, Set};

// ===== Activity Conversions =====

impl TryFrom<activity::Model> for Activity {
    type Error = anyhow::Error;

    fn try_from(entity: activity::Model) -> Result<Self, Self::Error> {
        let schedule: ScheduleJson = serde_json::from_value(entity.schedule)
            .with_context(|| format!("activity {} has a malformed schedule", entity.id))?;

        Ok(Self {
            id: entity.id,
            school_id: entity.school_id,
            teacher_id: entity.teacher_id,
            title: entity.title,
            description: entity.description,
            category: entity.category.parse()?,
            level: entity.level.parse()?,
            status: entity.status.parse()?,
            max_participants: u32::try_from(entity.max_participants)?,
            current_participants: u32::try_from(entity.current_participants)?,
            requires_approval: entity.requires_approval,
            allow_waitlist: entity.allow_waitlist,
            is_public: entity.is_public,
            schedule: schedule.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            version: entity.version,
        })
    }
}

impl TryFrom<&Activity> for activity::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &Activity) -> Result<Self, Self::Error> {
        let schedule = serde_json::to_value(ScheduleJson::from(&model.schedule))?;

        Ok(Self {
            id: Set(model.id),
            school_id: Set(model.school_id),
            teacher_id: Set(model.teacher_id),
            title: Set(model.title.clone()),
            description: Set(model.description.clone()),
            category: Set(model.category.as_str().to_string()),
            level: Set(model.level.as_str().to_string()),
            status: Set(model.status.as_str().to_string()),
            max_participants: Set(i32::try_from(model.max_participants)?),
            current_participants: Set(i32::try_from(model.current_participants)?),
            requires_approval: Set(model.requires_approval),
            allow_waitlist: Set(model.allow_waitlist),
            is_public: Set(model.is_public),
            schedule: Set(schedule),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
            version: Set(model.version),
        })
    }
}

// ===== Participation Conversions =====

impl TryFrom<participation::Model> for Participation {
    type Error = anyhow::Error;

    fn try_from(entity: participation::Model) -> Result<Self, Self::Error> {
        let attendance: Vec<AttendanceRecordJson> = serde_json::from_value(entity.attendance)
            .with_context(|| format!("participation {} has malformed attendance", entity.id))?;
        let participation_score = entity
            .participation_score
            .map(u8::try_from)
            .transpose()?;

        Ok(Self {
            id: entity.id,
            activity_id: entity.activity_id,
            student_id: entity.student_id,
            school_id: entity.school_id,
            status: entity.status.parse()?,
            waitlisted: entity.waitlisted,
            application_date: entity.application_date,
            application_message: entity.application_message,
            reviewed_by: entity.reviewed_by,
            reviewed_at: entity.reviewed_at,
            review_note: entity.review_note,
            attendance: attendance.into_iter().map(Into::into).collect(),
            participation_score,
            feedback: entity.feedback,
            completed_at: entity.completed_at,
            withdrawn_at: entity.withdrawn_at,
            updated_at: entity.updated_at,
            version: entity.version,
        })
    }
}

impl TryFrom<&Participation> for participation::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &Participation) -> Result<Self, Self::Error> {
        let attendance: Vec<AttendanceRecordJson> =
            model.attendance.iter().map(Into::into).collect();

        Ok(Self {
            id: Set(model.id),
            activity_id: Set(model.activity_id),
            student_id: Set(model.student_id),
            school_id: Set(model.school_id),
            status: Set(model.status.as_str().to_string()),
            waitlisted: Set(model.waitlisted),
            application_date: Set(model.application_date),
            application_message: Set(model.application_message.clone()),
            reviewed_by: Set(model.reviewed_by),
            reviewed_at: Set(model.reviewed_at),
            review_note: Set(model.review_note.clone()),
            attendance: Set(serde_json::to_value(attendance)?),
            participation_score: Set(model.participation_score.map(i16::from)),
            feedback: Set(model.feedback.clone()),
            completed_at: Set(model.completed_at),
            withdrawn_at: Set(model.withdrawn_at),
            updated_at: Set(model.updated_at),
            version: Set(model.version),
        })
    }
}

// ===== Audit Conversions =====

impl TryFrom<audit_log::Model> for AuditEntry {
    type Error = anyhow::Error;

    fn try_from(entity: audit_log::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            action: entity.action.parse()?,
            performed_by: entity.performed_by,
            target_id: entity.target_id,
            school_id: entity.school_id,
            details: entity.details,
            timestamp: entity.timestamp,
        })
    }
}

impl From<&AuditEntry> for audit_log::ActiveModel {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            seq: NotSet,
            id: Set(entry.id),
            action: Set(entry.action.as_str().to_string()),
            performed_by: Set(entry.performed_by),
            target_id: Set(entry.target_id),
            school_id: Set(entry.school_id),
            details: Set(entry.details.clone()),
            timestamp: Set(entry.timestamp),
        }
    }
}

// ===== JSON Serialization Helpers =====

/// JSON representation of the schedule column
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct ScheduleJson {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    meeting_days: Vec<String>,
    start_time: Option<String>,
    duration_minutes: Option<u32>,
    frequency: Option<String>,
    location: Option<String>,
}

/// JSON representation of one attendance array element
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct AttendanceRecordJson {
    date: NaiveDate,
    present: bool,
    #[serde(default)]
    excused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl From<ScheduleJson> for Schedule {
    fn from(json: ScheduleJson) -> Self {
        Self {
            start_date: json.start_date,
            end_date: json.end_date,
            meeting_days: json.meeting_days,
            start_time: json.start_time,
            duration_minutes: json.duration_minutes,
            frequency: json.frequency,
            location: json.location,
        }
    }
}

impl From<&Schedule> for ScheduleJson {
    fn from(schedule: &Schedule) -> Self {
        Self {
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            meeting_days: schedule.meeting_days.clone(),
            start_time: schedule.start_time.clone(),
            duration_minutes: schedule.duration_minutes,
            frequency: schedule.frequency.clone(),
            location: schedule.location.clone(),
        }
    }
}

impl From<AttendanceRecordJson> for AttendanceRecord {
    fn from(json: AttendanceRecordJson) -> Self {
        Self {
            date: json.date,
            present: json.present,
            excused: json.excused,
            note: json.note,
        }
    }
}

impl From<&AttendanceRecord> for AttendanceRecordJson {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            date: record.date,
            present: record.present,
            excused: record.excused,
            note: record.note.clone(),
        }
    }
}
