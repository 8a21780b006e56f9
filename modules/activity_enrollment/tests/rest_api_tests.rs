//! REST surface tests driving the router in-process

mod common;

use activity_enrollment::{Config, EnrollmentModule};
use axum::body::Body;
use axum::Router;
use common::{print_test_header, TestSchool};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn app() -> Router {
    let module = EnrollmentModule::new(Config::default());
    module.init().await.expect("Failed to init module");
    module
        .register_rest(Router::new())
        .expect("Failed to register routes")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    actor: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

fn activity_body(school: &TestSchool, max: u32, requires_approval: bool) -> Value {
    json!({
        "school_id": school.school_id,
        "title": "Debate Team",
        "description": "Regional tournament prep",
        "category": "academic",
        "level": "intermediate",
        "max_participants": max,
        "requires_approval": requires_approval,
        "schedule": {
            "meeting_days": ["monday"],
            "start_time": "16:00",
            "duration_minutes": 60
        }
    })
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}

#[tokio::test]
async fn test_enrollment_flow_over_http() {
    let app = app().await;
    let school = TestSchool::new();
    let teacher = Some(school.teacher);

    print_test_header(
        "test_enrollment_flow_over_http",
        &["Create, publish, apply, review, attendance and audit work through the REST routes."],
    );

    println!("\n📝 Stage 1: Create and publish");
    let (status, activity) = send(
        &app,
        Method::POST,
        "/activities",
        teacher,
        Some(activity_body(&school, 1, true)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(activity["status"], "draft");
    assert_eq!(activity["schedule"]["meeting_days"], json!(["monday"]));
    let activity_id = id_of(&activity);

    let (status, published) = send(
        &app,
        Method::POST,
        &format!("/activities/{activity_id}/publish"),
        teacher,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["status"], "active");

    println!("\n📝 Stage 2: Two applications, one seat");
    let mut applications = Vec::new();
    for n in 0..2 {
        let student = school.student(n);
        let (status, participation) = send(
            &app,
            Method::POST,
            &format!("/activities/{activity_id}/applications"),
            Some(student),
            Some(json!({ "student_id": student, "message": "pick me" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(participation["status"], "pending");
        applications.push(id_of(&participation));
    }

    let (status, approved) = send(
        &app,
        Method::POST,
        &format!("/participations/{}/review", applications[0]),
        teacher,
        Some(json!({ "decision": "approve", "note": "welcome" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["review_note"], "welcome");

    let (status, problem) = send(
        &app,
        Method::POST,
        &format!("/participations/{}/review", applications[1]),
        teacher,
        Some(json!({ "decision": "approve" })),
    )
    .await;
    println!("   Problem: {}", problem);
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["code"], "capacity_exceeded");
    assert_eq!(problem["retriable"], false);

    let (status, roster) = send(
        &app,
        Method::GET,
        &format!("/activities/{activity_id}/roster"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster["status"], "full");
    assert_eq!(roster["current_participants"], 1);
    assert_eq!(roster["available_seats"], 0);
    assert_eq!(roster["pending"], 1);

    println!("\n📝 Stage 3: Attendance");
    let (status, participation) = send(
        &app,
        Method::PUT,
        &format!("/participations/{}/attendance/2024-03-01", applications[0]),
        teacher,
        Some(json!({ "present": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(participation["attendance"].as_array().map(Vec::len), Some(1));

    let (status, rate) = send(
        &app,
        Method::GET,
        &format!("/participations/{}/attendance-rate", applications[0]),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rate["rate"], 1.0);

    let (status, summary) = send(
        &app,
        Method::GET,
        &format!("/activities/{activity_id}/attendance/2024-03-01"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["present"], 1);
    assert_eq!(summary["total"], 1);

    let (status, problem) = send(
        &app,
        Method::PUT,
        &format!("/participations/{}/attendance/2024-03-01", applications[1]),
        teacher,
        Some(json!({ "present": true })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem["code"], "participation_not_approved");

    println!("\n📝 Stage 4: Audit trail");
    let (status, audit) = send(
        &app,
        Method::GET,
        &format!("/audit?target_id={}", applications[0]),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["total"], 3);
    assert_eq!(audit["items"][0]["action"], "student_applied");
    assert_eq!(audit["items"][1]["action"], "participation_reviewed");
    assert_eq!(audit["items"][1]["performed_by"], json!(school.teacher));
    assert_eq!(audit["items"][2]["action"], "attendance_recorded");
}

#[tokio::test]
async fn test_actor_header_is_required_for_mutations() {
    let app = app().await;
    let school = TestSchool::new();

    print_test_header(
        "test_actor_header_is_required_for_mutations",
        &["Mutations without a valid x-actor-id header are rejected with 400."],
    );

    let (status, problem) = send(
        &app,
        Method::POST,
        "/activities",
        None,
        Some(activity_body(&school, 3, false)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["code"], "bad_request");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/activities")
        .header("x-actor-id", "not-a-uuid")
        .header("content-type", "application/json")
        .body(Body::from(activity_body(&school, 3, false).to_string()))
        .expect("valid request");
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/activities?school_id={}", school.school_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn test_domain_errors_map_to_problem_details() {
    let app = app().await;
    let school = TestSchool::new();
    let teacher = Some(school.teacher);

    print_test_header(
        "test_domain_errors_map_to_problem_details",
        &["Each error kind surfaces with its status code and stable code field."],
    );

    let (status, problem) = send(
        &app,
        Method::GET,
        &format!("/activities/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(problem["code"], "not_found");
    assert_eq!(problem["status"], 404);

    let (status, problem) = send(
        &app,
        Method::POST,
        "/activities",
        teacher,
        Some(activity_body(&school, 0, false)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem["code"], "validation");

    let mut bad_category = activity_body(&school, 3, false);
    bad_category["category"] = json!("knitting");
    let (status, problem) = send(&app, Method::POST, "/activities", teacher, Some(bad_category)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem["code"], "validation");

    let (_, activity) = send(
        &app,
        Method::POST,
        "/activities",
        teacher,
        Some(activity_body(&school, 3, false)),
    )
    .await;
    let activity_id = id_of(&activity);

    let (status, problem) = send(
        &app,
        Method::POST,
        &format!("/activities/{activity_id}/applications"),
        Some(school.student(0)),
        Some(json!({ "student_id": school.student(0) })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["code"], "activity_not_accepting_applications");

    let (status, problem) = send(
        &app,
        Method::PUT,
        &format!("/activities/{activity_id}/status"),
        teacher,
        Some(json!({ "status": "full" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["code"], "invalid_transition");

    let (status, problem) = send(&app, Method::GET, "/audit", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["code"], "bad_request");
}

#[tokio::test]
async fn test_activity_management_routes() {
    let app = app().await;
    let school = TestSchool::new();
    let teacher = Some(school.teacher);

    print_test_header(
        "test_activity_management_routes",
        &["Listing, patching, status changes, waitlists and deletion over HTTP."],
    );

    let (_, activity) = send(
        &app,
        Method::POST,
        "/activities",
        teacher,
        Some(activity_body(&school, 1, false)),
    )
    .await;
    let activity_id = id_of(&activity);

    let (status, drafts) = send(
        &app,
        Method::GET,
        &format!("/activities?school_id={}&status=draft", school.school_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(drafts["total"], 1);

    let (status, patched) = send(
        &app,
        Method::PATCH,
        &format!("/activities/{activity_id}"),
        teacher,
        Some(json!({ "allow_waitlist": true, "title": "Debate Society" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "Debate Society");
    assert_eq!(patched["allow_waitlist"], true);

    send(&app, Method::POST, &format!("/activities/{activity_id}/publish"), teacher, None).await;

    for n in 0..3 {
        let student = school.student(n);
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/activities/{activity_id}/applications"),
            Some(student),
            Some(json!({ "student_id": student })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, waitlist) = send(
        &app,
        Method::GET,
        &format!("/activities/{activity_id}/waitlist"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(waitlist["total"], 2);
    assert_eq!(waitlist["items"][0]["student_id"], json!(school.student(1)));

    let (status, approved) = send(
        &app,
        Method::GET,
        &format!("/activities/{activity_id}/participations?status=approved"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["total"], 1);
    let holder = approved["items"][0]["id"].as_str().expect("id").to_string();

    let (status, mine) = send(
        &app,
        Method::GET,
        &format!("/students/{}/participations", school.student(0)),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["items"][0]["id"], holder.as_str());

    let (status, completed) = send(
        &app,
        Method::POST,
        &format!("/participations/{holder}/complete"),
        teacher,
        Some(json!({ "score": 88, "feedback": "Strong rebuttals" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["participation_score"], 88);

    let (status, closed) = send(
        &app,
        Method::PUT,
        &format!("/activities/{activity_id}/status"),
        teacher,
        Some(json!({ "status": "closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/activities/{activity_id}"),
        teacher,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["removed_participations"], 3);

    let (status, _) = send(&app, Method::GET, &format!("/activities/{activity_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app().await;

    print_test_header(
        "test_openapi_document_is_served",
        &["The router serves an OpenAPI document describing its routes and error body."],
    );

    let (status, doc) = send(&app, Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Activity Enrollment API");

    let paths = doc["paths"].as_object().expect("paths object");
    assert!(paths.contains_key("/activities/{activity_id}/applications"));
    assert!(paths.contains_key("/participations/{participation_id}/review"));
    assert!(paths["/activities/{activity_id}/applications"]["post"].is_object());
    assert!(doc["components"]["schemas"]["Problem"].is_object());
}
