//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    dto::*,
    error::{map_domain_error, Problem},
    extract::ActorId,
};
use crate::contract::{
    ActivityCategory, ActivityFilter, ActivityPatch, ActivityStatus, AttendanceRecord, AuditQuery,
    AuditSubject, EnrollmentError, NewActivity, ParticipationStatus, ReviewDecision, TimeRange,
};
use crate::domain::Service;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

fn parse_tag<T>(value: &str) -> Result<T, Problem>
where
    T: std::str::FromStr<Err = EnrollmentError>,
{
    value.parse().map_err(map_domain_error)
}

// ===== Activity Handlers =====

/// Query parameters for listing activities
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListActivitiesQuery {
    pub school_id: Uuid,
    pub status: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub public_only: bool,
}

/// Create an activity in DRAFT
#[utoipa::path(
    post,
    path = "/activities",
    request_body = CreateActivityRequest,
    params(
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 201, description = "Activity created in DRAFT", body = ActivityDto),
        (status = 400, description = "Missing or malformed actor header", body = Problem),
        (status = 422, description = "Validation failed", body = Problem),
    ),
    tag = "activities"
)]
pub async fn create_activity(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityDto>), Problem> {
    let input = NewActivity::try_from(req).map_err(map_domain_error)?;
    let activity = service
        .create_activity(actor_id, input)
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(activity.into())))
}

/// List activities of a school
#[utoipa::path(
    get,
    path = "/activities",
    params(
        ListActivitiesQuery,
    ),
    responses(
        (status = 200, description = "Activities of the school", body = ActivitiesListResponse),
        (status = 422, description = "Validation failed", body = Problem),
    ),
    tag = "activities"
)]
pub async fn list_activities(
    Extension(service): Extension<Arc<Service>>,
    Query(query): Query<ListActivitiesQuery>,
) -> Result<Json<ActivitiesListResponse>, Problem> {
    let filter = ActivityFilter {
        status: query.status.as_deref().map(parse_tag::<ActivityStatus>).transpose()?,
        category: query
            .category
            .as_deref()
            .map(parse_tag::<ActivityCategory>)
            .transpose()?,
        public_only: query.public_only,
    };
    let activities = service
        .list_activities(query.school_id, filter)
        .await
        .map_err(map_domain_error)?;

    let items: Vec<ActivityDto> = activities.into_iter().map(Into::into).collect();
    let total = items.len();

    Ok(Json(ActivitiesListResponse { items, total }))
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}",
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
    ),
    responses(
        (status = 200, description = "Activity", body = ActivityDto),
        (status = 404, description = "Not found", body = Problem),
    ),
    tag = "activities"
)]
pub async fn get_activity(
    Extension(service): Extension<Arc<Service>>,
    Path(activity_id): Path<Uuid>,
) -> Result<Json<ActivityDto>, Problem> {
    let activity = service
        .get_activity(activity_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(activity.into()))
}

/// Patch activity details
#[utoipa::path(
    patch,
    path = "/activities/{activity_id}",
    request_body = UpdateActivityRequest,
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Activity updated", body = ActivityDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Invalid transition or capacity conflict", body = Problem),
        (status = 422, description = "Validation failed", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "activities"
)]
pub async fn update_activity(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(activity_id): Path<Uuid>,
    Json(req): Json<UpdateActivityRequest>,
) -> Result<Json<ActivityDto>, Problem> {
    let patch = ActivityPatch::try_from(req).map_err(map_domain_error)?;
    let activity = service
        .update_activity(activity_id, actor_id, patch)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(activity.into()))
}

/// Delete an activity with all its participations
#[utoipa::path(
    delete,
    path = "/activities/{activity_id}",
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Activity and its participations removed", body = DeleteActivityResponse),
        (status = 404, description = "Not found", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "activities"
)]
pub async fn delete_activity(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(activity_id): Path<Uuid>,
) -> Result<Json<DeleteActivityResponse>, Problem> {
    let removed_participations = service
        .delete_activity(activity_id, actor_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(DeleteActivityResponse {
        activity_id,
        removed_participations,
    }))
}

#[utoipa::path(
    post,
    path = "/activities/{activity_id}/publish",
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Activity published", body = ActivityDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Invalid transition or capacity conflict", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "activities"
)]
pub async fn publish_activity(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(activity_id): Path<Uuid>,
) -> Result<Json<ActivityDto>, Problem> {
    let activity = service
        .publish_activity(activity_id, actor_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(activity.into()))
}

#[utoipa::path(
    put,
    path = "/activities/{activity_id}/status",
    request_body = SetStatusRequest,
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Status changed", body = ActivityDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Invalid transition or capacity conflict", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "activities"
)]
pub async fn set_activity_status(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(activity_id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<ActivityDto>, Problem> {
    let status = parse_tag::<ActivityStatus>(&req.status)?;
    let activity = service
        .set_activity_status(activity_id, actor_id, status)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(activity.into()))
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}/roster",
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
    ),
    responses(
        (status = 200, description = "Capacity snapshot", body = RosterDto),
        (status = 404, description = "Not found", body = Problem),
    ),
    tag = "activities"
)]
pub async fn roster(
    Extension(service): Extension<Arc<Service>>,
    Path(activity_id): Path<Uuid>,
) -> Result<Json<RosterDto>, Problem> {
    let roster = service.roster(activity_id).await.map_err(map_domain_error)?;
    Ok(Json(roster.into()))
}

// ===== Participation Handlers =====

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParticipationsQuery {
    pub status: Option<String>,
}

/// Apply a student to an activity
#[utoipa::path(
    post,
    path = "/activities/{activity_id}/applications",
    request_body = ApplyRequest,
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 201, description = "Application recorded", body = ParticipationDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Invalid transition or capacity conflict", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "activities"
)]
pub async fn apply(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(activity_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ParticipationDto>), Problem> {
    let participation = service
        .apply(activity_id, req.student_id, actor_id, req.message)
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(participation.into())))
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}/participations",
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
        ListParticipationsQuery,
    ),
    responses(
        (status = 200, description = "Participations of the activity", body = ParticipationsListResponse),
        (status = 404, description = "Not found", body = Problem),
        (status = 422, description = "Validation failed", body = Problem),
    ),
    tag = "activities"
)]
pub async fn list_participations(
    Extension(service): Extension<Arc<Service>>,
    Path(activity_id): Path<Uuid>,
    Query(query): Query<ListParticipationsQuery>,
) -> Result<Json<ParticipationsListResponse>, Problem> {
    let status = query
        .status
        .as_deref()
        .map(parse_tag::<ParticipationStatus>)
        .transpose()?;
    let participations = service
        .list_participations(activity_id, status)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participations.into()))
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}/waitlist",
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
    ),
    responses(
        (status = 200, description = "Waitlisted applications, oldest first", body = ParticipationsListResponse),
        (status = 404, description = "Not found", body = Problem),
    ),
    tag = "activities"
)]
pub async fn waitlist(
    Extension(service): Extension<Arc<Service>>,
    Path(activity_id): Path<Uuid>,
) -> Result<Json<ParticipationsListResponse>, Problem> {
    let participations = service
        .waitlist(activity_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participations.into()))
}

#[utoipa::path(
    get,
    path = "/students/{student_id}/participations",
    params(
        ("student_id" = Uuid, Path, description = "Student id"),
    ),
    responses(
        (status = 200, description = "Participations of the student", body = ParticipationsListResponse),
    ),
    tag = "participations"
)]
pub async fn student_participations(
    Extension(service): Extension<Arc<Service>>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<ParticipationsListResponse>, Problem> {
    let participations = service
        .student_participations(student_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participations.into()))
}

#[utoipa::path(
    get,
    path = "/participations/{participation_id}",
    params(
        ("participation_id" = Uuid, Path, description = "Participation id"),
    ),
    responses(
        (status = 200, description = "Participation", body = ParticipationDto),
        (status = 404, description = "Not found", body = Problem),
    ),
    tag = "participations"
)]
pub async fn get_participation(
    Extension(service): Extension<Arc<Service>>,
    Path(participation_id): Path<Uuid>,
) -> Result<Json<ParticipationDto>, Problem> {
    let participation = service
        .get_participation(participation_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participation.into()))
}

/// Approve or reject a pending application
#[utoipa::path(
    post,
    path = "/participations/{participation_id}/review",
    request_body = ReviewRequest,
    params(
        ("participation_id" = Uuid, Path, description = "Participation id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Application reviewed", body = ParticipationDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Invalid transition or capacity conflict", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "participations"
)]
pub async fn review_application(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(participation_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ParticipationDto>, Problem> {
    let decision = parse_tag::<ReviewDecision>(&req.decision)?;
    let participation = service
        .review_application(participation_id, actor_id, decision, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participation.into()))
}

#[utoipa::path(
    post,
    path = "/participations/{participation_id}/withdraw",
    params(
        ("participation_id" = Uuid, Path, description = "Participation id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Participation withdrawn", body = ParticipationDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Invalid transition or capacity conflict", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "participations"
)]
pub async fn withdraw(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(participation_id): Path<Uuid>,
) -> Result<Json<ParticipationDto>, Problem> {
    let participation = service
        .withdraw(participation_id, actor_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participation.into()))
}

#[utoipa::path(
    post,
    path = "/participations/{participation_id}/complete",
    request_body = CompleteRequest,
    params(
        ("participation_id" = Uuid, Path, description = "Participation id"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Participation completed", body = ParticipationDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Invalid transition or capacity conflict", body = Problem),
        (status = 422, description = "Validation failed", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "participations"
)]
pub async fn complete_participation(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path(participation_id): Path<Uuid>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<ParticipationDto>, Problem> {
    let participation = service
        .complete_participation(participation_id, actor_id, req.score, req.feedback)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participation.into()))
}

// ===== Attendance Handlers =====

/// Upsert attendance for one date
#[utoipa::path(
    put,
    path = "/participations/{participation_id}/attendance/{date}",
    request_body = RecordAttendanceRequest,
    params(
        ("participation_id" = Uuid, Path, description = "Participation id"),
        ("date" = NaiveDate, Path, description = "Session date (YYYY-MM-DD)"),
        ("x-actor-id" = Uuid, Header, description = "Acting user"),
    ),
    responses(
        (status = 200, description = "Attendance stored", body = ParticipationDto),
        (status = 404, description = "Not found", body = Problem),
        (status = 422, description = "Validation failed", body = Problem),
        (status = 503, description = "Concurrency conflict, retry", body = Problem),
    ),
    tag = "attendance"
)]
pub async fn record_attendance(
    Extension(service): Extension<Arc<Service>>,
    ActorId(actor_id): ActorId,
    Path((participation_id, date)): Path<(Uuid, NaiveDate)>,
    Json(req): Json<RecordAttendanceRequest>,
) -> Result<Json<ParticipationDto>, Problem> {
    let record = AttendanceRecord {
        date,
        present: req.present,
        excused: req.excused,
        note: req.note,
    };
    let participation = service
        .record_attendance(participation_id, actor_id, record)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(participation.into()))
}

#[utoipa::path(
    get,
    path = "/participations/{participation_id}/attendance-rate",
    params(
        ("participation_id" = Uuid, Path, description = "Participation id"),
    ),
    responses(
        (status = 200, description = "Share of sessions attended", body = AttendanceRateDto),
        (status = 404, description = "Not found", body = Problem),
    ),
    tag = "attendance"
)]
pub async fn attendance_rate(
    Extension(service): Extension<Arc<Service>>,
    Path(participation_id): Path<Uuid>,
) -> Result<Json<AttendanceRateDto>, Problem> {
    let rate = service
        .attendance_rate(participation_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(AttendanceRateDto {
        participation_id,
        rate,
    }))
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}/attendance/{date}",
    params(
        ("activity_id" = Uuid, Path, description = "Activity id"),
        ("date" = NaiveDate, Path, description = "Session date (YYYY-MM-DD)"),
    ),
    responses(
        (status = 200, description = "Attendance of approved participants on the date", body = AttendanceSummaryDto),
        (status = 404, description = "Not found", body = Problem),
    ),
    tag = "attendance"
)]
pub async fn attendance_summary(
    Extension(service): Extension<Arc<Service>>,
    Path((activity_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<AttendanceSummaryDto>, Problem> {
    let summary = service
        .activity_attendance_summary(activity_id, date)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(summary.into()))
}

// ===== Audit Handlers =====

/// Exactly one of `target_id`, `school_id`, `actor_id` selects the entries
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQueryParams {
    pub target_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/audit",
    params(
        AuditQueryParams,
    ),
    responses(
        (status = 200, description = "Audit entries in commit order", body = AuditListResponse),
        (status = 400, description = "No single audit subject given", body = Problem),
    ),
    tag = "audit"
)]
pub async fn query_audit(
    Extension(service): Extension<Arc<Service>>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditListResponse>, Problem> {
    let subject = match (params.target_id, params.school_id, params.actor_id) {
        (Some(id), None, None) => AuditSubject::Target(id),
        (None, Some(id), None) => AuditSubject::School(id),
        (None, None, Some(id)) => AuditSubject::Actor(id),
        _ => {
            return Err(Problem::bad_request(
                "exactly one of target_id, school_id or actor_id is required",
            ))
        }
    };
    let query = AuditQuery {
        subject,
        range: TimeRange {
            from: params.from,
            until: params.until,
        },
        limit: params.limit,
    };

    let entries = service.query_audit(query).await.map_err(map_domain_error)?;
    let items: Vec<AuditEntryDto> = entries.into_iter().map(Into::into).collect();
    let total = items.len();

    Ok(Json(AuditListResponse { items, total }))
}
