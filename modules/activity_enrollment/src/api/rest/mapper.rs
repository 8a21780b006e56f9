//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.
//! Requests carrying string tags convert with `TryFrom` and fail with
//! `EnrollmentError::Validation`.

use super::dto::*;
use crate::contract::{self, EnrollmentError};

// ===== Activity conversions =====

impl From<contract::Schedule> for ScheduleDto {
    fn from(schedule: contract::Schedule) -> Self {
        Self {
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            meeting_days: schedule.meeting_days,
            start_time: schedule.start_time,
            duration_minutes: schedule.duration_minutes,
            frequency: schedule.frequency,
            location: schedule.location,
        }
    }
}

impl From<ScheduleDto> for contract::Schedule {
    fn from(dto: ScheduleDto) -> Self {
        Self {
            start_date: dto.start_date,
            end_date: dto.end_date,
            meeting_days: dto.meeting_days,
            start_time: dto.start_time,
            duration_minutes: dto.duration_minutes,
            frequency: dto.frequency,
            location: dto.location,
        }
    }
}

impl From<contract::Activity> for ActivityDto {
    fn from(activity: contract::Activity) -> Self {
        Self {
            available_seats: activity.available_seats(),
            id: activity.id,
            school_id: activity.school_id,
            teacher_id: activity.teacher_id,
            title: activity.title,
            description: activity.description,
            category: activity.category.to_string(),
            level: activity.level.to_string(),
            status: activity.status.to_string(),
            max_participants: activity.max_participants,
            current_participants: activity.current_participants,
            requires_approval: activity.requires_approval,
            allow_waitlist: activity.allow_waitlist,
            is_public: activity.is_public,
            schedule: activity.schedule.into(),
            created_at: activity.created_at,
            updated_at: activity.updated_at,
            version: activity.version,
        }
    }
}

impl TryFrom<CreateActivityRequest> for contract::NewActivity {
    type Error = EnrollmentError;

    fn try_from(req: CreateActivityRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            school_id: req.school_id,
            title: req.title,
            description: req.description,
            category: req.category.parse::<contract::ActivityCategory>()?,
            level: req.level.parse::<contract::ActivityLevel>()?,
            max_participants: req.max_participants,
            requires_approval: req.requires_approval,
            allow_waitlist: req.allow_waitlist,
            is_public: req.is_public,
            schedule: req.schedule.into(),
        })
    }
}

impl TryFrom<UpdateActivityRequest> for contract::ActivityPatch {
    type Error = EnrollmentError;

    fn try_from(req: UpdateActivityRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            description: req.description,
            category: req
                .category
                .map(|c| c.parse::<contract::ActivityCategory>())
                .transpose()?,
            level: req
                .level
                .map(|l| l.parse::<contract::ActivityLevel>())
                .transpose()?,
            max_participants: req.max_participants,
            requires_approval: req.requires_approval,
            allow_waitlist: req.allow_waitlist,
            is_public: req.is_public,
            schedule: req.schedule.map(Into::into),
        })
    }
}

impl From<contract::RosterSnapshot> for RosterDto {
    fn from(roster: contract::RosterSnapshot) -> Self {
        Self {
            activity_id: roster.activity_id,
            status: roster.status.to_string(),
            max_participants: roster.max_participants,
            current_participants: roster.current_participants,
            available_seats: roster.available_seats,
            pending: roster.pending,
            waitlisted: roster.waitlisted,
        }
    }
}

// ===== Participation conversions =====

impl From<contract::AttendanceRecord> for AttendanceRecordDto {
    fn from(record: contract::AttendanceRecord) -> Self {
        Self {
            date: record.date,
            present: record.present,
            excused: record.excused,
            note: record.note,
        }
    }
}

impl From<contract::Participation> for ParticipationDto {
    fn from(p: contract::Participation) -> Self {
        Self {
            id: p.id,
            activity_id: p.activity_id,
            student_id: p.student_id,
            school_id: p.school_id,
            status: p.status.to_string(),
            waitlisted: p.waitlisted,
            application_date: p.application_date,
            application_message: p.application_message,
            reviewed_by: p.reviewed_by,
            reviewed_at: p.reviewed_at,
            review_note: p.review_note,
            attendance: p.attendance.into_iter().map(Into::into).collect(),
            participation_score: p.participation_score,
            feedback: p.feedback,
            completed_at: p.completed_at,
            withdrawn_at: p.withdrawn_at,
            updated_at: p.updated_at,
            version: p.version,
        }
    }
}

impl From<Vec<contract::Participation>> for ParticipationsListResponse {
    fn from(participations: Vec<contract::Participation>) -> Self {
        let items: Vec<ParticipationDto> = participations.into_iter().map(Into::into).collect();
        let total = items.len();
        Self { items, total }
    }
}

// ===== Attendance conversions =====

impl From<contract::AttendanceSummary> for AttendanceSummaryDto {
    fn from(summary: contract::AttendanceSummary) -> Self {
        Self {
            total: summary.total(),
            activity_id: summary.activity_id,
            date: summary.date,
            present: summary.present,
            excused: summary.excused,
            absent: summary.absent,
            rate: summary.rate,
        }
    }
}

// ===== Audit conversions =====

impl From<contract::AuditEntry> for AuditEntryDto {
    fn from(entry: contract::AuditEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action.to_string(),
            performed_by: entry.performed_by,
            target_id: entry.target_id,
            school_id: entry.school_id,
            details: entry.details,
            timestamp: entry.timestamp,
        }
    }
}
