//! Audit log completeness, failure atomicity, queries and the post-commit feed

mod common;

use activity_enrollment::contract::{AuditAction, AuditQuery, TimeRange};
use activity_enrollment::domain::{AuditLog, EnrollmentEvent, Service};
use activity_enrollment::infra::{InMemoryAuditLog, InMemoryEnrollmentStore};
use activity_enrollment::{
    ActivityStatus, AttendanceRecord, AuditEntry, Config, EnrollmentError, ReviewDecision,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{date, new_activity, print_test_header, TestEngine, TestSchool};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Audit log that can be switched into a failing mode
struct FlakyAuditLog {
    inner: InMemoryAuditLog,
    failing: AtomicBool,
}

impl FlakyAuditLog {
    fn new() -> Self {
        Self {
            inner: InMemoryAuditLog::new(),
            failing: AtomicBool::new(false),
        }
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditLog for FlakyAuditLog {
    async fn append(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("audit volume unavailable");
        }
        self.inner.append(entry).await
    }

    async fn query(&self, query: &AuditQuery) -> anyhow::Result<Vec<AuditEntry>> {
        self.inner.query(query).await
    }
}

#[tokio::test]
async fn test_every_mutation_writes_one_audit_entry() {
    let engine = TestEngine::new();
    let school = TestSchool::new();

    print_test_header(
        "test_every_mutation_writes_one_audit_entry",
        &[
            "Each successful mutation appends exactly one entry with the right action.",
            "Failed calls append nothing.",
        ],
    );

    let mut expected = Vec::new();
    let mut check = |action: AuditAction, count: usize| {
        expected.push(action);
        assert_eq!(count, expected.len(), "after {}", action);
    };

    let draft = engine
        .service
        .create_activity(school.teacher, new_activity(&school, 2, true, false))
        .await
        .expect("create");
    check(AuditAction::ActivityCreated, engine.audit_count());

    engine.service.publish_activity(draft.id, school.teacher).await.expect("publish");
    check(AuditAction::ActivityStatusChanged, engine.audit_count());

    let p = engine
        .service
        .apply(draft.id, school.student(0), school.student(0), None)
        .await
        .expect("apply");
    check(AuditAction::StudentApplied, engine.audit_count());

    engine
        .service
        .review_application(p.id, school.teacher, ReviewDecision::Approve, None)
        .await
        .expect("approve");
    check(AuditAction::ParticipationReviewed, engine.audit_count());

    engine
        .service
        .record_attendance(p.id, school.teacher, AttendanceRecord {
            date: date(2024, 3, 1),
            present: true,
            excused: false,
            note: None,
        })
        .await
        .expect("attendance");
    check(AuditAction::AttendanceRecorded, engine.audit_count());

    engine
        .service
        .complete_participation(p.id, school.teacher, Some(80), None)
        .await
        .expect("complete");
    check(AuditAction::ParticipationCompleted, engine.audit_count());

    let q = engine
        .service
        .apply(draft.id, school.student(1), school.student(1), None)
        .await
        .expect("apply");
    check(AuditAction::StudentApplied, engine.audit_count());
    engine
        .service
        .review_application(q.id, school.teacher, ReviewDecision::Approve, None)
        .await
        .expect("approve");
    check(AuditAction::ParticipationReviewed, engine.audit_count());
    engine.service.withdraw(q.id, school.student(1)).await.expect("withdraw");
    check(AuditAction::StudentWithdrew, engine.audit_count());

    engine
        .service
        .set_activity_status(draft.id, school.teacher, ActivityStatus::Closed)
        .await
        .expect("close");
    check(AuditAction::ActivityStatusChanged, engine.audit_count());

    engine
        .service
        .delete_activity(draft.id, school.coordinator)
        .await
        .expect("delete");
    check(AuditAction::ActivityDeleted, engine.audit_count());

    let actions: Vec<_> = engine.audit_log.snapshot().iter().map(|e| e.action).collect();
    assert_eq!(actions, expected);

    // Failures leave no trace
    let before = engine.audit_count();
    let _ = engine.service.publish_activity(draft.id, school.teacher).await;
    let _ = engine.service.withdraw(p.id, school.student(0)).await;
    assert_eq!(engine.audit_count(), before);
}

#[tokio::test]
async fn test_audit_entries_describe_the_change() {
    let engine = TestEngine::new();
    let school = TestSchool::new();

    print_test_header(
        "test_audit_entries_describe_the_change",
        &["Audit entries carry actor, target, school and a decodable event payload."],
    );

    let activity = engine
        .published_activity(&school, new_activity(&school, 1, true, false))
        .await;
    let p = engine
        .service
        .apply(activity.id, school.student(0), school.student(0), None)
        .await
        .expect("apply");
    engine
        .service
        .review_application(p.id, school.coordinator, ReviewDecision::Approve, Some("ok".to_string()))
        .await
        .expect("approve");

    let entries = engine
        .service
        .query_audit(AuditQuery::for_target(p.id))
        .await
        .expect("query");
    assert_eq!(entries.len(), 2);

    let review = &entries[1];
    assert_eq!(review.action, AuditAction::ParticipationReviewed);
    assert_eq!(review.performed_by, school.coordinator);
    assert_eq!(review.school_id, school.school_id);
    assert_eq!(review.details["decision"], "approve");
    assert_eq!(review.details["current_participants"], 1);
    assert_eq!(review.details["activity_status"], "full");

    match EnrollmentEvent::from_details(&review.details) {
        Some(EnrollmentEvent::ParticipationReviewed(event)) => {
            assert_eq!(event.participation_id, p.id);
            assert_eq!(event.note.as_deref(), Some("ok"));
        }
        other => panic!("unexpected payload: {:?}", other),
    }

    let publish = engine
        .service
        .query_audit(AuditQuery::for_target(activity.id))
        .await
        .expect("query")
        .into_iter()
        .find(|e| e.action == AuditAction::ActivityStatusChanged)
        .expect("publish entry");
    assert_eq!(publish.details["from"], "draft");
    assert_eq!(publish.details["to"], "active");
    assert_eq!(publish.details["reason"], "published");
}

#[tokio::test]
async fn test_failed_audit_write_rolls_back() {
    let school = TestSchool::new();
    let audit_log = Arc::new(FlakyAuditLog::new());
    let store = Arc::new(InMemoryEnrollmentStore::new(audit_log.clone()));
    let service = Service::new(store.clone(), audit_log.clone(), Config::default());

    print_test_header(
        "test_failed_audit_write_rolls_back",
        &[
            "When the audit append fails the mutation is not committed.",
            "The caller gets AuditWriteFailed and state is exactly as before.",
        ],
    );

    let draft = service
        .create_activity(school.teacher, new_activity(&school, 1, false, false))
        .await
        .expect("create");
    let active = service.publish_activity(draft.id, school.teacher).await.expect("publish");

    println!("\n📝 Stage 1: Audit volume goes away");
    audit_log.fail(true);

    let err = service
        .apply(active.id, school.student(0), school.student(0), None)
        .await
        .expect_err("apply must fail without audit");
    println!("   Error: {}", err);
    assert!(matches!(err, EnrollmentError::AuditWriteFailed { .. }));
    assert!(!err.is_retriable());

    let unchanged = service.get_activity(active.id).await.expect("get");
    assert_eq!(unchanged, active);
    assert!(store.all_participations().await.is_empty());

    assert!(matches!(
        service
            .create_activity(school.teacher, new_activity(&school, 3, false, false))
            .await,
        Err(EnrollmentError::AuditWriteFailed { .. })
    ));
    assert_eq!(store.all_activities().await.len(), 1);

    println!("\n📝 Stage 2: Audit volume is back");
    audit_log.fail(false);
    let p = service
        .apply(active.id, school.student(0), school.student(0), None)
        .await
        .expect("apply after recovery");
    assert_eq!(p.version, 1);
    assert_eq!(audit_log.inner.len(), 3);
}

#[tokio::test]
async fn test_audit_queries_by_school_actor_and_window() {
    let engine = TestEngine::with_config(Config {
        audit_query_limit: 3,
        ..Config::default()
    });
    let school = TestSchool::new();
    let other = TestSchool::new();

    print_test_header(
        "test_audit_queries_by_school_actor_and_window",
        &[
            "Entries can be queried per school and per actor within a time window.",
            "The result size is clamped to the configured limit.",
        ],
    );

    let start = Utc::now() - Duration::seconds(1);
    let activity = engine
        .published_activity(&school, new_activity(&school, 5, false, false))
        .await;
    engine
        .published_activity(&other, new_activity(&other, 5, false, false))
        .await;
    engine
        .service
        .apply(activity.id, school.student(0), school.student(0), None)
        .await
        .expect("apply");
    engine
        .service
        .apply(activity.id, school.student(1), school.student(1), None)
        .await
        .expect("apply");

    let by_school = engine
        .service
        .query_audit(AuditQuery {
            limit: Some(100),
            ..AuditQuery::for_school(school.school_id)
        })
        .await
        .expect("query");
    assert_eq!(by_school.len(), 3, "clamped to audit_query_limit");
    assert!(by_school.iter().all(|e| e.school_id == school.school_id));
    assert_eq!(by_school[0].action, AuditAction::ActivityCreated);

    let by_student = engine
        .service
        .query_audit(AuditQuery::for_actor(school.student(1)))
        .await
        .expect("query");
    assert_eq!(by_student.len(), 1);
    assert_eq!(by_student[0].action, AuditAction::StudentApplied);

    let in_window = engine
        .service
        .query_audit(AuditQuery::for_actor(school.teacher).within(TimeRange {
            from: Some(start),
            until: Some(Utc::now() + Duration::seconds(1)),
        }))
        .await
        .expect("query");
    assert_eq!(in_window.len(), 2);

    let future = engine
        .service
        .query_audit(AuditQuery::for_school(school.school_id).within(TimeRange {
            from: Some(Utc::now() + Duration::hours(1)),
            until: None,
        }))
        .await
        .expect("query");
    assert!(future.is_empty());
}

#[tokio::test]
async fn test_subscribers_see_committed_entries_only() {
    let engine = TestEngine::new();
    let school = TestSchool::new();

    print_test_header(
        "test_subscribers_see_committed_entries_only",
        &["The post-commit feed delivers each committed entry once and nothing for failures."],
    );

    let activity = engine
        .published_activity(&school, new_activity(&school, 1, true, false))
        .await;
    let mut feed = engine.service.subscribe();

    let p = engine
        .service
        .apply(activity.id, school.student(0), school.student(0), None)
        .await
        .expect("apply");
    let _ = engine
        .service
        .apply(activity.id, school.student(0), school.student(0), None)
        .await;
    engine
        .service
        .review_application(p.id, school.teacher, ReviewDecision::Reject, None)
        .await
        .expect("reject");

    let applied = feed.recv().await.expect("applied entry");
    assert_eq!(applied.action, AuditAction::StudentApplied);
    let reviewed = feed.recv().await.expect("reviewed entry");
    assert_eq!(reviewed.action, AuditAction::ParticipationReviewed);
    assert!(reviewed.action.is_notifiable());
    assert!(feed.try_recv().is_err());

    let logged = engine.audit_log.snapshot();
    assert_eq!(logged.last(), Some(&reviewed));
}
