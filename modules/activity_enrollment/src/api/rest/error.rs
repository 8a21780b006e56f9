//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::EnrollmentError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// Stable machine-readable error kind
    pub code: String,

    /// Whether repeating the same request may succeed
    #[serde(default)]
    pub retriable: bool,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            code: code.into(),
            retriable: false,
            detail: None,
            instance: None,
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn retriable(mut self, retriable: bool) -> Self {
        self.retriable = retriable;
        self
    }

    /// 400 for requests the engine never saw
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", "bad_request").with_detail(detail)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: EnrollmentError) -> Problem {
    let (status, title) = match &error {
        EnrollmentError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not Found"),
        EnrollmentError::InvalidTransition { .. } => (StatusCode::CONFLICT, "Invalid Transition"),
        EnrollmentError::AlreadyParticipating { .. } => {
            (StatusCode::CONFLICT, "Already Participating")
        }
        EnrollmentError::ActivityNotAcceptingApplications { .. } => {
            (StatusCode::CONFLICT, "Activity Not Accepting Applications")
        }
        EnrollmentError::CapacityExceeded { .. } => (StatusCode::CONFLICT, "Capacity Exceeded"),
        EnrollmentError::ParticipationNotApproved { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "Participation Not Approved")
        }
        EnrollmentError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "Validation Error"),
        EnrollmentError::ConcurrencyConflict { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "Concurrency Conflict")
        }
        EnrollmentError::AuditWriteFailed { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Audit Write Failed")
        }
        EnrollmentError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Storage Error"),
        EnrollmentError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    };

    if status.is_server_error() {
        tracing::error!(code = error.code(), "request failed: {}", error);
    }

    Problem::new(status, title, error.code())
        .retriable(error.is_retriable())
        .with_detail(error.to_string())
}
