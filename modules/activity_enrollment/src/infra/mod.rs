//! Infrastructure layer - storage adapters

pub mod memory;
pub mod storage;

pub use memory::{InMemoryAuditLog, InMemoryEnrollmentStore};
pub use storage::repositories::{SeaOrmAuditLog, SeaOrmEnrollmentStore};
