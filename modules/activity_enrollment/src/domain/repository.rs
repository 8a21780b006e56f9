//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs and infra/memory.rs.
//!
//! Reads are plain lookups. The only write path is [`EnrollmentStore::commit`],
//! which applies a whole [`ChangeSet`] (state writes plus exactly one audit
//! entry) atomically, guarded by optimistic version checks.

use crate::contract::{Activity, AuditEntry, Participation};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Write of the activity record
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityWrite {
    /// New activity; fails if the id already exists
    Insert(Activity),
    /// Replace the stored activity if its version still equals `expected_version`
    Update {
        activity: Activity,
        expected_version: i64,
    },
    /// Delete the activity and every participation referencing it
    Delete {
        activity_id: Uuid,
        expected_version: i64,
    },
}

/// Write of one participation record
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipationWrite {
    Insert(Participation),
    Update {
        participation: Participation,
        expected_version: i64,
    },
}

/// One atomic unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub activity: Option<ActivityWrite>,
    pub participations: Vec<ParticipationWrite>,
    pub audit: AuditEntry,
}

impl ChangeSet {
    pub fn new(audit: AuditEntry) -> Self {
        Self {
            activity: None,
            participations: Vec::new(),
            audit,
        }
    }

    pub fn insert_activity(mut self, activity: Activity) -> Self {
        self.activity = Some(ActivityWrite::Insert(activity));
        self
    }

    pub fn update_activity(mut self, activity: Activity, expected_version: i64) -> Self {
        self.activity = Some(ActivityWrite::Update {
            activity,
            expected_version,
        });
        self
    }

    pub fn delete_activity(mut self, activity_id: Uuid, expected_version: i64) -> Self {
        self.activity = Some(ActivityWrite::Delete {
            activity_id,
            expected_version,
        });
        self
    }

    pub fn insert_participation(mut self, participation: Participation) -> Self {
        self.participations
            .push(ParticipationWrite::Insert(participation));
        self
    }

    pub fn update_participation(mut self, participation: Participation, expected_version: i64) -> Self {
        self.participations.push(ParticipationWrite::Update {
            participation,
            expected_version,
        });
        self
    }
}

/// Failure of a commit; in every case nothing was written
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A guarded record changed since it was read
    #[error("version conflict on {entity} {id}")]
    VersionConflict { entity: &'static str, id: Uuid },

    /// The audit entry could not be written
    #[error("audit append failed: {reason}")]
    AuditWrite { reason: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Storage for activities and participations
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Find an activity by id
    async fn find_activity(&self, activity_id: Uuid) -> Result<Option<Activity>>;

    /// All activities of a school, oldest first
    async fn list_activities(&self, school_id: Uuid) -> Result<Vec<Activity>>;

    /// Find a participation by id
    async fn find_participation(&self, participation_id: Uuid) -> Result<Option<Participation>>;

    /// Participations of an activity ordered by application date
    async fn list_participations_for_activity(&self, activity_id: Uuid)
        -> Result<Vec<Participation>>;

    /// Participations of a student ordered by application date
    async fn list_participations_for_student(&self, student_id: Uuid)
        -> Result<Vec<Participation>>;

    /// Apply all writes and the audit entry, or nothing
    async fn commit(&self, changes: ChangeSet) -> std::result::Result<(), StoreError>;
}
