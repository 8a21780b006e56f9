//! Attendance recording, rates and per-date summaries

mod common;

use activity_enrollment::contract::{AuditAction, AuditQuery};
use activity_enrollment::{AttendanceRecord, EnrollmentError, ReviewDecision};
use common::{date, new_activity, print_participation, print_test_header, TestEngine, TestSchool};

fn present(d: chrono::NaiveDate) -> AttendanceRecord {
    AttendanceRecord {
        date: d,
        present: true,
        excused: false,
        note: None,
    }
}

fn absent(d: chrono::NaiveDate, excused: bool) -> AttendanceRecord {
    AttendanceRecord {
        date: d,
        present: false,
        excused,
        note: excused.then(|| "doctor's note".to_string()),
    }
}

#[tokio::test]
async fn test_attendance_is_idempotent_per_date() {
    let engine = TestEngine::new();
    let school = TestSchool::new();

    print_test_header(
        "test_attendance_is_idempotent_per_date",
        &[
            "Recording the same date twice keeps one record with the latest values.",
            "The attendance rate counts only present sessions.",
        ],
    );

    let activity = engine
        .published_activity(&school, new_activity(&school, 2, false, false))
        .await;
    let p = engine
        .service
        .apply(activity.id, school.student(1), school.student(1), None)
        .await
        .expect("Failed to apply");

    let session = date(2024, 3, 1);
    println!("\n📝 Stage 1: Mark present on {}", session);
    engine
        .service
        .record_attendance(p.id, school.teacher, present(session))
        .await
        .expect("Failed to record attendance");

    println!("\n📝 Stage 2: Correct to excused absence");
    let corrected = engine
        .service
        .record_attendance(p.id, school.teacher, absent(session, true))
        .await
        .expect("Failed to record attendance");
    print_participation("S2", &corrected);

    assert_eq!(corrected.attendance.len(), 1);
    let record = corrected.attendance_on(session).expect("record for session");
    assert!(!record.present);
    assert!(record.excused);

    let rate = engine.service.attendance_rate(p.id).await.expect("rate");
    assert_eq!(rate, 0.0);

    let entries = engine
        .service
        .query_audit(AuditQuery::for_target(p.id))
        .await
        .expect("query audit")
        .into_iter()
        .filter(|e| e.action == AuditAction::AttendanceRecorded)
        .collect::<Vec<_>>();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].details["replaced"], false);
    assert_eq!(entries[1].details["replaced"], true);
}

#[tokio::test]
async fn test_attendance_records_stay_sorted() {
    let engine = TestEngine::new();
    let school = TestSchool::new();

    print_test_header(
        "test_attendance_records_stay_sorted",
        &["Records entered out of order are kept sorted by date; present clears excused."],
    );

    let activity = engine
        .published_activity(&school, new_activity(&school, 2, false, false))
        .await;
    let p = engine
        .service
        .apply(activity.id, school.student(0), school.student(0), None)
        .await
        .expect("Failed to apply");

    for d in [date(2024, 3, 8), date(2024, 3, 1), date(2024, 3, 15)] {
        engine
            .service
            .record_attendance(p.id, school.teacher, present(d))
            .await
            .expect("Failed to record attendance");
    }
    let updated = engine
        .service
        .record_attendance(p.id, school.teacher, AttendanceRecord {
            date: date(2024, 3, 22),
            present: true,
            excused: true,
            note: None,
        })
        .await
        .expect("Failed to record attendance");

    let dates: Vec<_> = updated.attendance.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 3, 1), date(2024, 3, 8), date(2024, 3, 15), date(2024, 3, 22)]
    );
    assert!(!updated.attendance[3].excused);

    engine
        .service
        .record_attendance(p.id, school.teacher, absent(date(2024, 3, 29), false))
        .await
        .expect("Failed to record attendance");
    let rate = engine.service.attendance_rate(p.id).await.expect("rate");
    assert!((rate - 0.8).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_attendance_requires_approved_participation() {
    let engine = TestEngine::new();
    let school = TestSchool::new();

    print_test_header(
        "test_attendance_requires_approved_participation",
        &["Pending and withdrawn participations reject attendance with ParticipationNotApproved."],
    );

    let activity = engine
        .published_activity(&school, new_activity(&school, 2, true, false))
        .await;
    let p = engine
        .service
        .apply(activity.id, school.student(0), school.student(0), None)
        .await
        .expect("Failed to apply");
    let audit_before = engine.audit_count();

    assert!(matches!(
        engine
            .service
            .record_attendance(p.id, school.teacher, present(date(2024, 3, 1)))
            .await,
        Err(EnrollmentError::ParticipationNotApproved { ref status, .. }) if status == "pending"
    ));
    assert_eq!(engine.audit_count(), audit_before);

    engine
        .service
        .review_application(p.id, school.teacher, ReviewDecision::Approve, None)
        .await
        .expect("approve");
    engine
        .service
        .withdraw(p.id, school.student(0))
        .await
        .expect("withdraw");

    assert!(matches!(
        engine
            .service
            .record_attendance(p.id, school.teacher, present(date(2024, 3, 1)))
            .await,
        Err(EnrollmentError::ParticipationNotApproved { ref status, .. }) if status == "withdrawn"
    ));
}

#[tokio::test]
async fn test_activity_attendance_summary() {
    let engine = TestEngine::new();
    let school = TestSchool::new();

    print_test_header(
        "test_activity_attendance_summary",
        &[
            "The per-date summary counts approved participants only.",
            "Participants without a record for the date count as absent.",
        ],
    );

    let activity = engine
        .published_activity(&school, new_activity(&school, 5, false, false))
        .await;
    let mut participants = Vec::new();
    for n in 0..4 {
        participants.push(
            engine
                .service
                .apply(activity.id, school.student(n), school.student(n), None)
                .await
                .expect("Failed to apply"),
        );
    }
    let session = date(2024, 4, 2);

    engine
        .service
        .record_attendance(participants[0].id, school.teacher, present(session))
        .await
        .expect("record");
    engine
        .service
        .record_attendance(participants[1].id, school.teacher, absent(session, true))
        .await
        .expect("record");
    engine
        .service
        .record_attendance(participants[2].id, school.teacher, present(session))
        .await
        .expect("record");
    engine
        .service
        .withdraw(participants[2].id, school.student(2))
        .await
        .expect("withdraw");

    let summary = engine
        .service
        .activity_attendance_summary(activity.id, session)
        .await
        .expect("summary");
    println!("   Summary: {:?}", summary);

    assert_eq!(summary.present, 1);
    assert_eq!(summary.excused, 1);
    assert_eq!(summary.absent, 1);
    assert_eq!(summary.total(), 3);
    assert!((summary.rate - 1.0 / 3.0).abs() < 1e-9);

    let empty = engine
        .service
        .activity_attendance_summary(activity.id, date(2024, 4, 9))
        .await
        .expect("summary");
    assert_eq!(empty.present, 0);
    assert_eq!(empty.absent, 3);
    assert_eq!(empty.rate, 0.0);
}
