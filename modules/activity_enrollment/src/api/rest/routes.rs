//! Route registration

use super::{handlers, openapi};
use crate::domain::Service;
use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;

/// Register all REST routes on `router`
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        // Activity endpoints
        .route(
            "/activities",
            get(handlers::list_activities).post(handlers::create_activity),
        )
        .route(
            "/activities/{activity_id}",
            get(handlers::get_activity)
                .patch(handlers::update_activity)
                .delete(handlers::delete_activity),
        )
        .route(
            "/activities/{activity_id}/publish",
            post(handlers::publish_activity),
        )
        .route(
            "/activities/{activity_id}/status",
            put(handlers::set_activity_status),
        )
        .route("/activities/{activity_id}/roster", get(handlers::roster))
        .route(
            "/activities/{activity_id}/applications",
            post(handlers::apply),
        )
        .route(
            "/activities/{activity_id}/participations",
            get(handlers::list_participations),
        )
        .route("/activities/{activity_id}/waitlist", get(handlers::waitlist))
        .route(
            "/activities/{activity_id}/attendance/{date}",
            get(handlers::attendance_summary),
        )
        // Participation endpoints
        .route(
            "/participations/{participation_id}",
            get(handlers::get_participation),
        )
        .route(
            "/participations/{participation_id}/review",
            post(handlers::review_application),
        )
        .route(
            "/participations/{participation_id}/withdraw",
            post(handlers::withdraw),
        )
        .route(
            "/participations/{participation_id}/complete",
            post(handlers::complete_participation),
        )
        .route(
            "/participations/{participation_id}/attendance/{date}",
            put(handlers::record_attendance),
        )
        .route(
            "/participations/{participation_id}/attendance-rate",
            get(handlers::attendance_rate),
        )
        .route(
            "/students/{student_id}/participations",
            get(handlers::student_participations),
        )
        // Audit endpoints
        .route("/audit", get(handlers::query_audit))
        .route("/openapi.json", get(openapi::openapi_json))
        // Add service as extension for handlers
        .layer(Extension(service))
}
