//! SeaORM repository implementations

use crate::contract::{Activity, AuditEntry, AuditQuery, AuditSubject, Participation};
use crate::domain::audit::AuditLog;
use crate::domain::repository::{
    ActivityWrite, ChangeSet, EnrollmentStore, ParticipationWrite, StoreError,
};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::entity::{activity, audit_log, participation};

fn backend(e: DbErr) -> StoreError {
    StoreError::Backend(e.into())
}

// ===== Enrollment Store =====

/// Store backed by a SQL database; each commit is one transaction
pub struct SeaOrmEnrollmentStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmEnrollmentStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn write_activity<C: ConnectionTrait>(
        conn: &C,
        write: &ActivityWrite,
    ) -> std::result::Result<(), StoreError> {
        match write {
            ActivityWrite::Insert(model) => {
                let active: activity::ActiveModel = model.try_into()?;
                activity::Entity::insert(active)
                    .exec(conn)
                    .await
                    .map_err(backend)?;
            }
            ActivityWrite::Update {
                activity: model,
                expected_version,
            } => {
                let active: activity::ActiveModel = model.try_into()?;
                let result = activity::Entity::update_many()
                    .set(active)
                    .filter(activity::Column::Id.eq(model.id))
                    .filter(activity::Column::Version.eq(*expected_version))
                    .exec(conn)
                    .await
                    .map_err(backend)?;
                if result.rows_affected == 0 {
                    return Err(StoreError::VersionConflict {
                        entity: "activity",
                        id: model.id,
                    });
                }
            }
            ActivityWrite::Delete {
                activity_id,
                expected_version,
            } => {
                // Dependents first so the delete does not depend on FK enforcement
                participation::Entity::delete_many()
                    .filter(participation::Column::ActivityId.eq(*activity_id))
                    .exec(conn)
                    .await
                    .map_err(backend)?;
                let result = activity::Entity::delete_many()
                    .filter(activity::Column::Id.eq(*activity_id))
                    .filter(activity::Column::Version.eq(*expected_version))
                    .exec(conn)
                    .await
                    .map_err(backend)?;
                if result.rows_affected == 0 {
                    return Err(StoreError::VersionConflict {
                        entity: "activity",
                        id: *activity_id,
                    });
                }
            }
        }
        Ok(())
    }

    async fn write_participation<C: ConnectionTrait>(
        conn: &C,
        write: &ParticipationWrite,
    ) -> std::result::Result<(), StoreError> {
        match write {
            ParticipationWrite::Insert(model) => {
                let active: participation::ActiveModel = model.try_into()?;
                participation::Entity::insert(active)
                    .exec(conn)
                    .await
                    .map_err(backend)?;
            }
            ParticipationWrite::Update {
                participation: model,
                expected_version,
            } => {
                let active: participation::ActiveModel = model.try_into()?;
                let result = participation::Entity::update_many()
                    .set(active)
                    .filter(participation::Column::Id.eq(model.id))
                    .filter(participation::Column::Version.eq(*expected_version))
                    .exec(conn)
                    .await
                    .map_err(backend)?;
                if result.rows_affected == 0 {
                    return Err(StoreError::VersionConflict {
                        entity: "participation",
                        id: model.id,
                    });
                }
            }
        }
        Ok(())
    }

    async fn write_all<C: ConnectionTrait>(
        conn: &C,
        changes: &ChangeSet,
    ) -> std::result::Result<(), StoreError> {
        if let Some(write) = &changes.activity {
            Self::write_activity(conn, write).await?;
        }
        for write in &changes.participations {
            Self::write_participation(conn, write).await?;
        }

        let audit: audit_log::ActiveModel = (&changes.audit).into();
        audit_log::Entity::insert(audit)
            .exec(conn)
            .await
            .map_err(|e| StoreError::AuditWrite {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for SeaOrmEnrollmentStore {
    async fn find_activity(&self, activity_id: Uuid) -> Result<Option<Activity>> {
        let result = activity::Entity::find_by_id(activity_id)
            .one(&*self.db)
            .await?;

        match result {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list_activities(&self, school_id: Uuid) -> Result<Vec<Activity>> {
        let results = activity::Entity::find()
            .filter(activity::Column::SchoolId.eq(school_id))
            .order_by_asc(activity::Column::CreatedAt)
            .order_by_asc(activity::Column::Id)
            .all(&*self.db)
            .await?;

        results
            .into_iter()
            .map(|e| e.try_into())
            .collect::<Result<Vec<_>>>()
    }

    async fn find_participation(&self, participation_id: Uuid) -> Result<Option<Participation>> {
        let result = participation::Entity::find_by_id(participation_id)
            .one(&*self.db)
            .await?;

        match result {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list_participations_for_activity(
        &self,
        activity_id: Uuid,
    ) -> Result<Vec<Participation>> {
        let results = participation::Entity::find()
            .filter(participation::Column::ActivityId.eq(activity_id))
            .order_by_asc(participation::Column::ApplicationDate)
            .order_by_asc(participation::Column::Id)
            .all(&*self.db)
            .await?;

        results
            .into_iter()
            .map(|e| e.try_into())
            .collect::<Result<Vec<_>>>()
    }

    async fn list_participations_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Participation>> {
        let results = participation::Entity::find()
            .filter(participation::Column::StudentId.eq(student_id))
            .order_by_asc(participation::Column::ApplicationDate)
            .order_by_asc(participation::Column::Id)
            .all(&*self.db)
            .await?;

        results
            .into_iter()
            .map(|e| e.try_into())
            .collect::<Result<Vec<_>>>()
    }

    async fn commit(&self, changes: ChangeSet) -> std::result::Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;

        match Self::write_all(&txn, &changes).await {
            Ok(()) => txn.commit().await.map_err(backend),
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(error = %rollback, "transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

// ===== Audit Log =====

/// Read side of the `enrollment_audit_log` table; rows are written by
/// [`SeaOrmEnrollmentStore::commit`]
pub struct SeaOrmAuditLog {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmAuditLog {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditLog for SeaOrmAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let active: audit_log::ActiveModel = entry.into();
        audit_log::Entity::insert(active).exec(&*self.db).await?;
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let mut select = audit_log::Entity::find();

        select = match query.subject {
            AuditSubject::Target(id) => select.filter(audit_log::Column::TargetId.eq(id)),
            AuditSubject::School(id) => select.filter(audit_log::Column::SchoolId.eq(id)),
            AuditSubject::Actor(id) => select.filter(audit_log::Column::PerformedBy.eq(id)),
        };
        if let Some(from) = query.range.from {
            select = select.filter(audit_log::Column::Timestamp.gte(from));
        }
        if let Some(until) = query.range.until {
            select = select.filter(audit_log::Column::Timestamp.lt(until));
        }
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let results = select
            .order_by_asc(audit_log::Column::Seq)
            .all(&*self.db)
            .await?;

        results
            .into_iter()
            .map(|e| e.try_into())
            .collect::<Result<Vec<_>>>()
    }
}
