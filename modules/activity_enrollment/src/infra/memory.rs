//! In-memory storage adapters
//!
//! All state sits behind one async mutex, so a commit is trivially atomic.
//! Version checks run first, the audit append second and state mutation last:
//! a failed append leaves the store exactly as it was.

use crate::contract::{Activity, AuditEntry, AuditQuery, Participation};
use crate::domain::audit::AuditLog;
use crate::domain::repository::{
    ActivityWrite, ChangeSet, EnrollmentStore, ParticipationWrite, StoreError,
};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

// ===== Audit Log =====

/// Append-only audit log kept in a vector; insertion order is commit order
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry, oldest first
    pub fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.entries.write().push(entry.clone());
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|e| query.matches(e))
            .take(limit)
            .cloned()
            .collect())
    }
}

// ===== Enrollment Store =====

#[derive(Default)]
struct State {
    activities: HashMap<Uuid, Activity>,
    participations: HashMap<Uuid, Participation>,
}

impl State {
    fn check_activity(&self, write: &ActivityWrite) -> std::result::Result<(), StoreError> {
        let (id, expected) = match write {
            ActivityWrite::Insert(a) => (a.id, None),
            ActivityWrite::Update {
                activity,
                expected_version,
            } => (activity.id, Some(*expected_version)),
            ActivityWrite::Delete {
                activity_id,
                expected_version,
            } => (*activity_id, Some(*expected_version)),
        };
        let stored = self.activities.get(&id).map(|a| a.version);
        if stored == expected {
            Ok(())
        } else {
            Err(StoreError::VersionConflict {
                entity: "activity",
                id,
            })
        }
    }

    fn check_participation(
        &self,
        write: &ParticipationWrite,
    ) -> std::result::Result<(), StoreError> {
        let (id, expected) = match write {
            ParticipationWrite::Insert(p) => (p.id, None),
            ParticipationWrite::Update {
                participation,
                expected_version,
            } => (participation.id, Some(*expected_version)),
        };
        let stored = self.participations.get(&id).map(|p| p.version);
        if stored == expected {
            Ok(())
        } else {
            Err(StoreError::VersionConflict {
                entity: "participation",
                id,
            })
        }
    }

    fn apply(&mut self, changes: ChangeSet) {
        match changes.activity {
            Some(ActivityWrite::Insert(activity)) | Some(ActivityWrite::Update { activity, .. }) => {
                self.activities.insert(activity.id, activity);
            }
            Some(ActivityWrite::Delete { activity_id, .. }) => {
                self.activities.remove(&activity_id);
                self.participations
                    .retain(|_, p| p.activity_id != activity_id);
            }
            None => {}
        }
        for write in changes.participations {
            let participation = match write {
                ParticipationWrite::Insert(p) => p,
                ParticipationWrite::Update { participation, .. } => participation,
            };
            self.participations.insert(participation.id, participation);
        }
    }
}

/// Process-local store with the same atomicity guarantees as the SQL store
pub struct InMemoryEnrollmentStore {
    state: Mutex<State>,
    audit_log: Arc<dyn AuditLog>,
}

impl InMemoryEnrollmentStore {
    /// Store that appends audit entries to `audit_log`
    pub fn new(audit_log: Arc<dyn AuditLog>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            audit_log,
        }
    }

    /// Every participation currently stored
    pub async fn all_participations(&self) -> Vec<Participation> {
        self.state.lock().await.participations.values().cloned().collect()
    }

    /// Every activity currently stored
    pub async fn all_activities(&self) -> Vec<Activity> {
        self.state.lock().await.activities.values().cloned().collect()
    }
}

fn by_application_date(mut participations: Vec<Participation>) -> Vec<Participation> {
    participations.sort_by(|a, b| {
        a.application_date
            .cmp(&b.application_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    participations
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn find_activity(&self, activity_id: Uuid) -> Result<Option<Activity>> {
        Ok(self.state.lock().await.activities.get(&activity_id).cloned())
    }

    async fn list_activities(&self, school_id: Uuid) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .state
            .lock()
            .await
            .activities
            .values()
            .filter(|a| a.school_id == school_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(activities)
    }

    async fn find_participation(&self, participation_id: Uuid) -> Result<Option<Participation>> {
        Ok(self
            .state
            .lock()
            .await
            .participations
            .get(&participation_id)
            .cloned())
    }

    async fn list_participations_for_activity(
        &self,
        activity_id: Uuid,
    ) -> Result<Vec<Participation>> {
        let participations = self
            .state
            .lock()
            .await
            .participations
            .values()
            .filter(|p| p.activity_id == activity_id)
            .cloned()
            .collect();
        Ok(by_application_date(participations))
    }

    async fn list_participations_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Participation>> {
        let participations = self
            .state
            .lock()
            .await
            .participations
            .values()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect();
        Ok(by_application_date(participations))
    }

    async fn commit(&self, changes: ChangeSet) -> std::result::Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if let Some(write) = &changes.activity {
            state.check_activity(write)?;
        }
        for write in &changes.participations {
            state.check_participation(write)?;
        }

        self.audit_log
            .append(&changes.audit)
            .await
            .map_err(|e| StoreError::AuditWrite {
                reason: e.to_string(),
            })?;

        state.apply(changes);
        Ok(())
    }
}
