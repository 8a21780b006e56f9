//! Domain service - enrollment engine orchestration
//!
//! Every mutating operation follows the same loop: read the records it
//! touches, compute the next state with the state machines and the capacity
//! ledger, then hand one [`ChangeSet`] (state plus its audit entry) to the
//! store. A version conflict means another writer got there first; the loop
//! re-reads and tries again until `Config::commit_attempts` is spent.

use super::audit::{effective_limit, AuditLog};
use super::events::{ActivityDeletedEvent, ActivityUpdatedEvent, AttendanceRecordedEvent, EnrollmentEvent};
use super::repository::{ChangeSet, EnrollmentStore, StoreError};
use super::{activity_state, attendance, capacity, participation_state, validation};
use crate::config::Config;
use crate::contract::{
    Activity, ActivityFilter, ActivityPatch, ActivityStatus, AttendanceRecord, AttendanceSummary,
    AuditEntry, AuditQuery, EnrollmentError, NewActivity, Participation, ParticipationStatus,
    ReviewDecision, RosterSnapshot,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain service for activity enrollment
pub struct Service {
    store: Arc<dyn EnrollmentStore>,
    audit_log: Arc<dyn AuditLog>,
    config: Config,
    /// Post-commit audit feed for notification fan-out
    feed: broadcast::Sender<AuditEntry>,
}

impl Service {
    /// Create a new service instance.
    ///
    /// `audit_log` must be the log `store` appends to; the service only reads it.
    pub fn new(store: Arc<dyn EnrollmentStore>, audit_log: Arc<dyn AuditLog>, config: Config) -> Self {
        let (feed, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            store,
            audit_log,
            config,
            feed,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Receive every audit entry committed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEntry> {
        self.feed.subscribe()
    }

    // ===== Activity Operations =====

    /// Create an activity in DRAFT with no participants
    pub async fn create_activity(
        &self,
        teacher_id: Uuid,
        input: NewActivity,
    ) -> Result<Activity, EnrollmentError> {
        validation::validate_new_activity(&input)?;

        let now = Utc::now();
        let activity = Activity {
            id: Uuid::new_v4(),
            school_id: input.school_id,
            teacher_id,
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category,
            level: input.level,
            status: ActivityStatus::Draft,
            max_participants: input.max_participants,
            current_participants: 0,
            requires_approval: input.requires_approval,
            allow_waitlist: input.allow_waitlist,
            is_public: input.is_public,
            schedule: input.schedule,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        let audit = EnrollmentEvent::activity_created(&activity).into_audit_entry(
            teacher_id,
            activity.id,
            activity.school_id,
        )?;
        if !self
            .try_commit(ChangeSet::new(audit).insert_activity(activity.clone()))
            .await?
        {
            return Err(self.exhausted(activity.id, 1));
        }

        info!(activity_id = %activity.id, school_id = %activity.school_id, "activity created");
        Ok(activity)
    }

    /// Edit activity details, including capacity
    pub async fn update_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
        patch: ActivityPatch,
    ) -> Result<Activity, EnrollmentError> {
        validation::validate_patch(&patch)?;

        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current = self.load_activity(activity_id).await?;
            if activity_state::is_terminal(current.status) {
                return Err(activity_state::invalid(current.status, current.status));
            }

            let mut next = current.clone();
            let changed_fields = apply_patch(&mut next, &patch)?;
            stage_activity(&mut next, &current);

            let event = EnrollmentEvent::ActivityUpdated(ActivityUpdatedEvent {
                activity_id,
                changed_fields,
                max_participants: next.max_participants,
                current_participants: next.current_participants,
                status_from: current.status.to_string(),
                status_to: next.status.to_string(),
            });
            let audit = event.into_audit_entry(actor_id, activity_id, next.school_id)?;

            let changes = ChangeSet::new(audit).update_activity(next.clone(), current.version);
            if self.try_commit(changes).await? {
                return Ok(next);
            }
            debug!(%activity_id, attempt, "update_activity: retrying after conflict");
        }
        Err(self.exhausted(activity_id, attempts))
    }

    /// DRAFT -> ACTIVE
    pub async fn publish_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Activity, EnrollmentError> {
        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current = self.load_activity(activity_id).await?;
            let mut next = current.clone();
            next.status = activity_state::publish(current.status)?;
            stage_activity(&mut next, &current);

            let audit = EnrollmentEvent::activity_status_changed(
                &next,
                current.status.as_str(),
                Some("published"),
            )
            .into_audit_entry(actor_id, activity_id, next.school_id)?;

            if self
                .try_commit(ChangeSet::new(audit).update_activity(next.clone(), current.version))
                .await?
            {
                info!(%activity_id, "activity published");
                return Ok(next);
            }
            debug!(%activity_id, attempt, "publish_activity: retrying after conflict");
        }
        Err(self.exhausted(activity_id, attempts))
    }

    /// Caller-initiated status change; ACTIVE <-> FULL is reserved for the ledger
    pub async fn set_activity_status(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
        status: ActivityStatus,
    ) -> Result<Activity, EnrollmentError> {
        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current = self.load_activity(activity_id).await?;
            let mut next = current.clone();
            next.status = activity_state::request(current.status, status)?;
            stage_activity(&mut next, &current);

            let audit =
                EnrollmentEvent::activity_status_changed(&next, current.status.as_str(), None)
                    .into_audit_entry(actor_id, activity_id, next.school_id)?;

            if self
                .try_commit(ChangeSet::new(audit).update_activity(next.clone(), current.version))
                .await?
            {
                info!(%activity_id, from = %current.status, to = %next.status, "activity status changed");
                return Ok(next);
            }
            debug!(%activity_id, attempt, "set_activity_status: retrying after conflict");
        }
        Err(self.exhausted(activity_id, attempts))
    }

    /// Delete an activity and all its participations. Returns how many
    /// participations were removed.
    pub async fn delete_activity(
        &self,
        activity_id: Uuid,
        actor_id: Uuid,
    ) -> Result<usize, EnrollmentError> {
        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current = self.load_activity(activity_id).await?;
            let removed = self
                .store
                .list_participations_for_activity(activity_id)
                .await
                .map_err(storage_error)?
                .len();

            let event = EnrollmentEvent::ActivityDeleted(ActivityDeletedEvent {
                activity_id,
                title: current.title.clone(),
                removed_participations: removed,
            });
            let audit = event.into_audit_entry(actor_id, activity_id, current.school_id)?;

            if self
                .try_commit(ChangeSet::new(audit).delete_activity(activity_id, current.version))
                .await?
            {
                info!(%activity_id, removed, "activity deleted");
                return Ok(removed);
            }
            debug!(%activity_id, attempt, "delete_activity: retrying after conflict");
        }
        Err(self.exhausted(activity_id, attempts))
    }

    pub async fn get_activity(&self, activity_id: Uuid) -> Result<Activity, EnrollmentError> {
        self.load_activity(activity_id).await
    }

    pub async fn list_activities(
        &self,
        school_id: Uuid,
        filter: ActivityFilter,
    ) -> Result<Vec<Activity>, EnrollmentError> {
        let activities = self
            .store
            .list_activities(school_id)
            .await
            .map_err(storage_error)?;
        Ok(activities.into_iter().filter(|a| filter.matches(a)).collect())
    }

    /// Capacity snapshot derived from the activity and its participations
    pub async fn roster(&self, activity_id: Uuid) -> Result<RosterSnapshot, EnrollmentError> {
        let activity = self.load_activity(activity_id).await?;
        let participations = self.participations_of(activity_id).await?;

        let pending: Vec<&Participation> = participations
            .iter()
            .filter(|p| p.status == ParticipationStatus::Pending)
            .collect();

        Ok(RosterSnapshot {
            activity_id,
            status: activity.status,
            max_participants: activity.max_participants,
            current_participants: activity.current_participants,
            available_seats: activity.available_seats(),
            pending: pending.len() as u32,
            waitlisted: pending.iter().filter(|p| p.waitlisted).count() as u32,
        })
    }

    // ===== Participation Operations =====

    /// Apply to an activity.
    ///
    /// Without `requires_approval` the seat is taken immediately. When the
    /// activity is FULL and keeps a waitlist the application is stored as a
    /// waitlisted PENDING record.
    pub async fn apply(
        &self,
        activity_id: Uuid,
        student_id: Uuid,
        actor_id: Uuid,
        message: Option<String>,
    ) -> Result<Participation, EnrollmentError> {
        validation::validate_text("application_message", message.as_deref())?;

        // Set once a direct approval lost its commit to a concurrent writer
        let mut lost_seat_race = false;

        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current = self.load_activity(activity_id).await?;
            let existing = self.participations_of(activity_id).await?;
            if existing
                .iter()
                .any(|p| p.student_id == student_id && p.status.is_active())
            {
                return Err(EnrollmentError::AlreadyParticipating {
                    activity_id,
                    student_id,
                });
            }

            let waitlisted = match capacity::admission(&current) {
                capacity::Admission::Open => false,
                capacity::Admission::Waitlist => true,
                capacity::Admission::Closed => {
                    if lost_seat_race && current.status == ActivityStatus::Full {
                        return Err(EnrollmentError::CapacityExceeded {
                            activity_id,
                            max_participants: current.max_participants,
                        });
                    }
                    return Err(EnrollmentError::ActivityNotAcceptingApplications {
                        activity_id,
                        status: current.status.to_string(),
                    });
                }
            };

            let now = Utc::now();
            let status = participation_state::initial(current.requires_approval, waitlisted);
            let mut next = current.clone();
            if status == ParticipationStatus::Approved {
                capacity::reserve_seat(&mut next)?;
            }
            stage_activity(&mut next, &current);

            let participation = Participation {
                id: Uuid::new_v4(),
                activity_id,
                student_id,
                school_id: current.school_id,
                status,
                waitlisted,
                application_date: now,
                application_message: message.clone(),
                reviewed_by: None,
                reviewed_at: None,
                review_note: None,
                attendance: Vec::new(),
                participation_score: None,
                feedback: None,
                completed_at: None,
                withdrawn_at: None,
                updated_at: now,
                version: 1,
            };

            let audit = EnrollmentEvent::student_applied(&next, &participation).into_audit_entry(
                actor_id,
                participation.id,
                participation.school_id,
            )?;
            let changes = ChangeSet::new(audit)
                .update_activity(next.clone(), current.version)
                .insert_participation(participation.clone());

            if self.try_commit(changes).await? {
                info!(
                    %activity_id,
                    participation_id = %participation.id,
                    %student_id,
                    status = %participation.status,
                    waitlisted,
                    current_participants = next.current_participants,
                    "student applied"
                );
                return Ok(participation);
            }
            if status == ParticipationStatus::Approved {
                lost_seat_race = true;
            }
            debug!(%activity_id, %student_id, attempt, "apply: retrying after conflict");
        }
        Err(self.exhausted(activity_id, attempts))
    }

    /// Approve or reject a PENDING application
    pub async fn review_application(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        decision: ReviewDecision,
        note: Option<String>,
    ) -> Result<Participation, EnrollmentError> {
        validation::validate_text("review_note", note.as_deref())?;

        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current_p = self.load_participation(participation_id).await?;
            let target = participation_state::transition(
                current_p.status,
                participation_state::review_target(decision),
            )?;
            let current_a = self.load_activity(current_p.activity_id).await?;

            let mut next_a = current_a.clone();
            if decision == ReviewDecision::Approve {
                if !matches!(
                    current_a.status,
                    ActivityStatus::Active | ActivityStatus::Full | ActivityStatus::Closed
                ) {
                    return Err(EnrollmentError::ActivityNotAcceptingApplications {
                        activity_id: current_a.id,
                        status: current_a.status.to_string(),
                    });
                }
                capacity::reserve_seat(&mut next_a)?;
            }
            stage_activity(&mut next_a, &current_a);

            let now = Utc::now();
            let mut next_p = current_p.clone();
            next_p.status = target;
            next_p.reviewed_by = Some(actor_id);
            next_p.reviewed_at = Some(now);
            next_p.review_note = note.clone();
            stage_participation(&mut next_p, &current_p, now);

            let audit = EnrollmentEvent::participation_reviewed(&next_a, &next_p, decision.as_str())
                .into_audit_entry(actor_id, participation_id, next_p.school_id)?;
            let changes = ChangeSet::new(audit)
                .update_activity(next_a.clone(), current_a.version)
                .update_participation(next_p.clone(), current_p.version);

            if self.try_commit(changes).await? {
                info!(
                    %participation_id,
                    activity_id = %next_a.id,
                    %decision,
                    current_participants = next_a.current_participants,
                    activity_status = %next_a.status,
                    "application reviewed"
                );
                return Ok(next_p);
            }
            debug!(%participation_id, attempt, "review_application: retrying after conflict");
        }
        Err(self.exhausted(participation_id, attempts))
    }

    /// APPROVED -> WITHDRAWN, releasing the seat
    pub async fn withdraw(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Participation, EnrollmentError> {
        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current_p = self.load_participation(participation_id).await?;
            let target =
                participation_state::transition(current_p.status, ParticipationStatus::Withdrawn)?;
            let current_a = self.load_activity(current_p.activity_id).await?;

            let mut next_a = current_a.clone();
            capacity::release_seat(&mut next_a)?;
            stage_activity(&mut next_a, &current_a);

            let now = Utc::now();
            let mut next_p = current_p.clone();
            next_p.status = target;
            next_p.withdrawn_at = Some(now);
            stage_participation(&mut next_p, &current_p, now);

            let audit = EnrollmentEvent::student_withdrew(&next_a, &next_p).into_audit_entry(
                actor_id,
                participation_id,
                next_p.school_id,
            )?;
            let changes = ChangeSet::new(audit)
                .update_activity(next_a.clone(), current_a.version)
                .update_participation(next_p.clone(), current_p.version);

            if self.try_commit(changes).await? {
                info!(
                    %participation_id,
                    activity_id = %next_a.id,
                    current_participants = next_a.current_participants,
                    activity_status = %next_a.status,
                    "student withdrew"
                );
                return Ok(next_p);
            }
            debug!(%participation_id, attempt, "withdraw: retrying after conflict");
        }
        Err(self.exhausted(participation_id, attempts))
    }

    /// APPROVED -> COMPLETED; the seat stays taken
    pub async fn complete_participation(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        score: Option<u8>,
        feedback: Option<String>,
    ) -> Result<Participation, EnrollmentError> {
        validation::validate_score(score)?;
        validation::validate_text("feedback", feedback.as_deref())?;

        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current = self.load_participation(participation_id).await?;
            let target =
                participation_state::transition(current.status, ParticipationStatus::Completed)?;

            let now = Utc::now();
            let mut next = current.clone();
            next.status = target;
            next.completed_at = Some(now);
            next.participation_score = score;
            next.feedback = feedback.clone();
            stage_participation(&mut next, &current, now);

            let audit = EnrollmentEvent::participation_completed(&next).into_audit_entry(
                actor_id,
                participation_id,
                next.school_id,
            )?;
            let changes =
                ChangeSet::new(audit).update_participation(next.clone(), current.version);

            if self.try_commit(changes).await? {
                info!(%participation_id, score = ?score, "participation completed");
                return Ok(next);
            }
            debug!(%participation_id, attempt, "complete_participation: retrying after conflict");
        }
        Err(self.exhausted(participation_id, attempts))
    }

    pub async fn get_participation(
        &self,
        participation_id: Uuid,
    ) -> Result<Participation, EnrollmentError> {
        self.load_participation(participation_id).await
    }

    /// Participations of an activity, optionally narrowed to one status
    pub async fn list_participations(
        &self,
        activity_id: Uuid,
        status: Option<ParticipationStatus>,
    ) -> Result<Vec<Participation>, EnrollmentError> {
        self.load_activity(activity_id).await?;
        let participations = self.participations_of(activity_id).await?;
        Ok(participations
            .into_iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .collect())
    }

    /// Every participation of a student across activities
    pub async fn student_participations(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Participation>, EnrollmentError> {
        self.store
            .list_participations_for_student(student_id)
            .await
            .map_err(storage_error)
    }

    /// Waitlisted PENDING records, oldest application first
    pub async fn waitlist(&self, activity_id: Uuid) -> Result<Vec<Participation>, EnrollmentError> {
        self.load_activity(activity_id).await?;
        let participations = self.participations_of(activity_id).await?;
        Ok(participations
            .into_iter()
            .filter(|p| p.waitlisted && p.status == ParticipationStatus::Pending)
            .collect())
    }

    // ===== Attendance Operations =====

    /// Upsert the attendance record for `record.date`
    pub async fn record_attendance(
        &self,
        participation_id: Uuid,
        actor_id: Uuid,
        record: AttendanceRecord,
    ) -> Result<Participation, EnrollmentError> {
        validation::validate_text("note", record.note.as_deref())?;

        let attempts = self.config.commit_attempts();
        for attempt in 1..=attempts {
            let current = self.load_participation(participation_id).await?;
            attendance::ensure_recordable(&current)?;

            let now = Utc::now();
            let mut next = current.clone();
            let replaced = attendance::upsert(&mut next.attendance, record.clone());
            stage_participation(&mut next, &current, now);

            let stored = next.attendance_on(record.date).cloned().unwrap_or_else(|| record.clone());
            let event = EnrollmentEvent::AttendanceRecorded(AttendanceRecordedEvent {
                activity_id: next.activity_id,
                participation_id,
                date: stored.date,
                present: stored.present,
                excused: stored.excused,
                replaced,
            });
            let audit = event.into_audit_entry(actor_id, participation_id, next.school_id)?;
            let changes =
                ChangeSet::new(audit).update_participation(next.clone(), current.version);

            if self.try_commit(changes).await? {
                debug!(%participation_id, date = %record.date, replaced, "attendance recorded");
                return Ok(next);
            }
            debug!(%participation_id, attempt, "record_attendance: retrying after conflict");
        }
        Err(self.exhausted(participation_id, attempts))
    }

    pub async fn attendance_rate(&self, participation_id: Uuid) -> Result<f64, EnrollmentError> {
        let participation = self.load_participation(participation_id).await?;
        Ok(attendance::rate(&participation.attendance))
    }

    pub async fn activity_attendance_summary(
        &self,
        activity_id: Uuid,
        date: NaiveDate,
    ) -> Result<AttendanceSummary, EnrollmentError> {
        self.load_activity(activity_id).await?;
        let participations = self.participations_of(activity_id).await?;
        Ok(attendance::summarize(activity_id, date, &participations))
    }

    // ===== Audit =====

    /// Read-only audit lookup; the limit is clamped to `audit_query_limit`
    pub async fn query_audit(&self, query: AuditQuery) -> Result<Vec<AuditEntry>, EnrollmentError> {
        let query = AuditQuery {
            limit: Some(effective_limit(query.limit, self.config.audit_query_limit)),
            ..query
        };
        self.audit_log.query(&query).await.map_err(storage_error)
    }

    // ===== Helper Methods =====

    async fn load_activity(&self, activity_id: Uuid) -> Result<Activity, EnrollmentError> {
        self.store
            .find_activity(activity_id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| EnrollmentError::activity_not_found(activity_id))
    }

    async fn load_participation(
        &self,
        participation_id: Uuid,
    ) -> Result<Participation, EnrollmentError> {
        self.store
            .find_participation(participation_id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| EnrollmentError::participation_not_found(participation_id))
    }

    async fn participations_of(&self, activity_id: Uuid) -> Result<Vec<Participation>, EnrollmentError> {
        self.store
            .list_participations_for_activity(activity_id)
            .await
            .map_err(storage_error)
    }

    /// Commit a change set. `Ok(false)` means a version conflict: nothing was
    /// written and the caller should re-read.
    async fn try_commit(&self, changes: ChangeSet) -> Result<bool, EnrollmentError> {
        let entry = changes.audit.clone();
        match self.store.commit(changes).await {
            Ok(()) => {
                // No subscribers is not an error
                let _ = self.feed.send(entry);
                Ok(true)
            }
            Err(StoreError::VersionConflict { entity, id }) => {
                debug!(entity, %id, action = %entry.action, "version conflict");
                Ok(false)
            }
            Err(StoreError::AuditWrite { reason }) => {
                warn!(action = %entry.action, target_id = %entry.target_id, %reason, "audit append failed, change rolled back");
                Err(EnrollmentError::AuditWriteFailed { reason })
            }
            Err(StoreError::Backend(e)) => {
                warn!(action = %entry.action, target_id = %entry.target_id, error = %e, "storage failure");
                Err(storage_error(e))
            }
        }
    }

    fn exhausted(&self, target_id: Uuid, attempts: u32) -> EnrollmentError {
        warn!(%target_id, attempts, "optimistic concurrency retries exhausted");
        EnrollmentError::ConcurrencyConflict {
            target_id,
            attempts,
        }
    }
}

fn storage_error(e: anyhow::Error) -> EnrollmentError {
    EnrollmentError::Storage {
        message: e.to_string(),
    }
}

/// Next version of an activity write
fn stage_activity(next: &mut Activity, current: &Activity) {
    next.version = current.version + 1;
    next.updated_at = Utc::now();
}

fn stage_participation(next: &mut Participation, current: &Participation, now: DateTime<Utc>) {
    next.version = current.version + 1;
    next.updated_at = now;
}

/// Apply `patch` and return the names of fields whose value changed
fn apply_patch(activity: &mut Activity, patch: &ActivityPatch) -> Result<Vec<String>, EnrollmentError> {
    let mut changed = Vec::new();

    macro_rules! set_field {
        ($field:ident, $value:expr) => {
            if let Some(value) = $value {
                if activity.$field != value {
                    activity.$field = value;
                    changed.push(stringify!($field).to_string());
                }
            }
        };
    }

    set_field!(title, patch.title.as_ref().map(|t| t.trim().to_string()));
    set_field!(description, patch.description.clone());
    set_field!(category, patch.category);
    set_field!(level, patch.level);
    set_field!(requires_approval, patch.requires_approval);
    set_field!(allow_waitlist, patch.allow_waitlist);
    set_field!(is_public, patch.is_public);
    set_field!(schedule, patch.schedule.clone());

    if let Some(max) = patch.max_participants {
        if max != activity.max_participants {
            capacity::resize(activity, max)?;
            changed.push("max_participants".to_string());
        }
    }

    Ok(changed)
}
