//! Domain layer - business logic and services

pub mod activity_state;
pub mod attendance;
pub mod audit;
pub mod capacity;
pub mod events;
pub mod participation_state;
pub mod repository;
pub mod service;
pub mod validation;

pub use audit::AuditLog;
pub use events::EnrollmentEvent;
pub use repository::{ActivityWrite, ChangeSet, EnrollmentStore, ParticipationWrite, StoreError};
pub use service::Service;
