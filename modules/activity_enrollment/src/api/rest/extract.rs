//! Request extractors

use super::error::Problem;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Header carrying the already-authorized caller id
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Caller id recorded as `performed_by` in the audit log.
///
/// Authorization happens upstream; the engine only needs to know who acted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for ActorId {
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| Problem::bad_request(format!("missing {} header", ACTOR_HEADER)))?;

        value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(ActorId)
            .ok_or_else(|| Problem::bad_request(format!("{} must be a UUID", ACTOR_HEADER)))
    }
}
