//! Common test utilities: a school with staff and students, activity
//! fixtures and an engine wired to the in-memory store.
#![allow(dead_code)]

use activity_enrollment::contract::{ActivityCategory, ActivityLevel, Schedule};
use activity_enrollment::domain::{capacity, Service};
use activity_enrollment::infra::{InMemoryAuditLog, InMemoryEnrollmentStore};
use activity_enrollment::{Activity, Config, NewActivity, Participation};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// One school tenant with a teacher and a handful of students
#[derive(Debug, Clone)]
pub struct TestSchool {
    pub school_id: Uuid,
    pub teacher: Uuid,
    pub coordinator: Uuid,
    pub students: Vec<Uuid>,
}

impl TestSchool {
    pub fn new() -> Self {
        Self {
            school_id: Uuid::new_v4(),
            teacher: Uuid::new_v4(),
            coordinator: Uuid::new_v4(),
            students: (0..8).map(|_| Uuid::new_v4()).collect(),
        }
    }

    /// Student `n`, zero-based
    pub fn student(&self, n: usize) -> Uuid {
        self.students[n]
    }

    pub fn print_structure(&self) {
        println!("\n🏫 School: {}", self.school_id);
        println!("   ├─ Teacher: {}", self.teacher);
        println!("   ├─ Coordinator: {}", self.coordinator);
        for (i, s) in self.students.iter().enumerate() {
            println!("   {} Student S{}: {}", if i + 1 == self.students.len() { "└─" } else { "├─" }, i + 1, s);
        }
    }
}

impl Default for TestSchool {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine plus direct handles on its storage for invariant checks
pub struct TestEngine {
    pub service: Arc<Service>,
    pub store: Arc<InMemoryEnrollmentStore>,
    pub audit_log: Arc<InMemoryAuditLog>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let audit_log = Arc::new(InMemoryAuditLog::new());
        let store = Arc::new(InMemoryEnrollmentStore::new(audit_log.clone()));
        let service = Arc::new(Service::new(store.clone(), audit_log.clone(), config));
        Self {
            service,
            store,
            audit_log,
        }
    }

    /// Audit entries written so far
    pub fn audit_count(&self) -> usize {
        self.audit_log.len()
    }

    /// `current_participants` matches the seat-holding records of every activity
    pub async fn assert_capacity_consistent(&self) {
        let participations = self.store.all_participations().await;
        for activity in self.store.all_activities().await {
            assert!(
                capacity::is_consistent(&activity, &participations),
                "activity {} reports {} of {} seats but records disagree",
                activity.id,
                activity.current_participants,
                activity.max_participants
            );
        }
    }

    /// Create and publish an activity owned by the school's teacher
    pub async fn published_activity(&self, school: &TestSchool, input: NewActivity) -> Activity {
        let draft = self
            .service
            .create_activity(school.teacher, input)
            .await
            .expect("Failed to create activity");
        self.service
            .publish_activity(draft.id, school.teacher)
            .await
            .expect("Failed to publish activity")
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Activity input with the given capacity and admission flags
pub fn new_activity(
    school: &TestSchool,
    max_participants: u32,
    requires_approval: bool,
    allow_waitlist: bool,
) -> NewActivity {
    NewActivity {
        school_id: school.school_id,
        title: "Robotics Club".to_string(),
        description: "Build and program competition robots".to_string(),
        category: ActivityCategory::Technology,
        level: ActivityLevel::AllLevels,
        max_participants,
        requires_approval,
        allow_waitlist,
        is_public: true,
        schedule: Schedule {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            meeting_days: vec!["tuesday".to_string(), "thursday".to_string()],
            start_time: Some("15:30".to_string()),
            duration_minutes: Some(90),
            frequency: Some("weekly".to_string()),
            location: Some("Lab 204".to_string()),
        },
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

pub fn print_activity(label: &str, activity: &Activity) {
    println!(
        "   {}: status={} seats={}/{} version={}",
        label,
        activity.status,
        activity.current_participants,
        activity.max_participants,
        activity.version
    );
}

pub fn print_participation(label: &str, participation: &Participation) {
    println!(
        "   {}: status={} waitlisted={} attendance={} version={}",
        label,
        participation.status,
        participation.waitlisted,
        participation.attendance.len(),
        participation.version
    );
}
