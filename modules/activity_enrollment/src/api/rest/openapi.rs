//! OpenAPI document for the enrollment REST surface, served at `/openapi.json`

use super::{dto, error, handlers};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Activity Enrollment API",
        description = "Activities, capacity-checked participation, attendance and the audit trail.\n\nMutating requests identify the caller with the `x-actor-id` header."
    ),
    paths(
        // Activities
        handlers::create_activity,
        handlers::list_activities,
        handlers::get_activity,
        handlers::update_activity,
        handlers::delete_activity,
        handlers::publish_activity,
        handlers::set_activity_status,
        handlers::roster,
        handlers::apply,
        handlers::list_participations,
        handlers::waitlist,
        // Participations
        handlers::student_participations,
        handlers::get_participation,
        handlers::review_application,
        handlers::withdraw,
        handlers::complete_participation,
        // Attendance
        handlers::record_attendance,
        handlers::attendance_rate,
        handlers::attendance_summary,
        // Audit
        handlers::query_audit,
    ),
    components(
        schemas(
            dto::ScheduleDto,
            dto::ActivityDto,
            dto::CreateActivityRequest,
            dto::UpdateActivityRequest,
            dto::SetStatusRequest,
            dto::ActivitiesListResponse,
            dto::DeleteActivityResponse,
            dto::RosterDto,
            dto::AttendanceRecordDto,
            dto::ParticipationDto,
            dto::ParticipationsListResponse,
            dto::ApplyRequest,
            dto::ReviewRequest,
            dto::CompleteRequest,
            dto::RecordAttendanceRequest,
            dto::AttendanceRateDto,
            dto::AttendanceSummaryDto,
            dto::AuditEntryDto,
            dto::AuditListResponse,
            error::Problem,
        )
    ),
    tags(
        (name = "activities", description = "Activity lifecycle, capacity and applications"),
        (name = "participations", description = "Review, withdrawal and completion of participations"),
        (name = "attendance", description = "Per-date attendance and rates"),
        (name = "audit", description = "Read-only compliance trail"),
    )
)]
pub struct ApiDoc;

/// GET /openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
