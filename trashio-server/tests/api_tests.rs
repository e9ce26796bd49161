//! HTTP routing tests for trashio-server

mod helpers;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use helpers::{approve, cleaning, TestEnv};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use trashio_common::scoring::CleaningDecision;
use trashio_server::build_router;
use trashio_server::models::{GeoPoint, Role};
use uuid::Uuid;

fn app(env: &TestEnv) -> Router {
    build_router(env.state.clone())
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn report_body(citizen_id: Uuid) -> Value {
    json!({
        "citizen_id": citizen_id,
        "description": "Illegal dumping near the river path",
        "lat": 0.0,
        "lng": 0.0,
        "before_image_url": "https://img.example.org/before.jpg"
    })
}

#[tokio::test]
async fn test_health_reports_module() {
    let env = TestEnv::new().await.unwrap();
    let (status, body) = send(app(&env), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "trashio-server");
}

#[tokio::test]
async fn test_create_user_and_duplicate_email() {
    let env = TestEnv::new().await.unwrap();
    let body = json!({
        "full_name": "Ada Worker",
        "email": "Ada@Example.org",
        "role": "cleaner",
        "location": { "lat": 1.0, "lng": 2.0 }
    });

    let (status, user) = send(app(&env), Method::POST, "/users", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "worker");
    assert_eq!(user["email"], "ada@example.org");

    let (status, error) = send(app(&env), Method::POST, "/users", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], "CONFLICT");

    let (status, workers) = send(app(&env), Method::GET, "/workers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(workers.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_invalid_user_is_bad_request() {
    let env = TestEnv::new().await.unwrap();
    let body = json!({ "full_name": "A", "email": "nobody", "role": "citizen" });

    let (status, error) = send(app(&env), Method::POST, "/users", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_submit_report_returns_created_with_scored_report() {
    let env = TestEnv::new().await.unwrap();
    let citizen = env.seed_user(Role::Citizen, None).await.unwrap();
    let worker = env.seed_user(Role::Worker, Some(GeoPoint::new(0.0, 0.0))).await.unwrap();
    env.scoring.push_before(approve("api-1"));

    let (status, report) =
        send(app(&env), Method::POST, "/reports", Some(report_body(citizen.id))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["status"], "Assigned");
    assert_eq!(report["assigned_worker_id"], json!(worker.id));
    assert_eq!(report["ai_decision"], "approve");

    let uri = format!("/citizens/{}/reports", citizen.id);
    let (status, list) = send(app(&env), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let uri = format!("/workers/{}/reports", worker.id);
    let (_, list) = send(app(&env), Method::GET, &uri, None).await;
    assert_eq!(list[0]["id"], report["id"]);
}

#[tokio::test]
async fn test_submit_report_with_scoring_down_is_still_created() {
    let env = TestEnv::new().await.unwrap();
    let citizen = env.seed_user(Role::Citizen, None).await.unwrap();

    let (status, report) =
        send(app(&env), Method::POST, "/reports", Some(report_body(citizen.id))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["status"], "Pending");
}

#[tokio::test]
async fn test_out_of_range_location_is_rejected() {
    let env = TestEnv::new().await.unwrap();
    let citizen = env.seed_user(Role::Citizen, None).await.unwrap();
    let mut body = report_body(citizen.id);
    body["lat"] = json!(120.0);

    let (status, _) = send(app(&env), Method::POST, "/reports", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_report_is_not_found_with_error_body() {
    let env = TestEnv::new().await.unwrap();
    let uri = format!("/reports/{}", Uuid::new_v4());

    let (status, body) = send(app(&env), Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"].as_str().unwrap().contains("report"));
}

#[tokio::test]
async fn test_cleaning_by_other_worker_is_forbidden_then_conflict_when_late() {
    let env = TestEnv::new().await.unwrap();
    let citizen = env.seed_user(Role::Citizen, None).await.unwrap();
    let worker = env.seed_user(Role::Worker, Some(GeoPoint::new(0.0, 0.0))).await.unwrap();
    let other = env.seed_user(Role::Worker, None).await.unwrap();
    env.scoring.push_before(approve("api-2"));

    let (_, report) =
        send(app(&env), Method::POST, "/reports", Some(report_body(citizen.id))).await;
    let uri = format!("/reports/{}/cleaning", report["id"].as_str().unwrap());

    let body = |worker_id: Uuid| {
        json!({ "worker_id": worker_id, "after_image_url": "https://img.example.org/after.jpg" })
    };

    let (status, error) = send(app(&env), Method::POST, &uri, Some(body(other.id))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["error"]["code"], "FORBIDDEN");

    env.scoring.push_after(cleaning(CleaningDecision::Accept, "api-2", "api-2-after"));
    let (status, cleaned) = send(app(&env), Method::POST, &uri, Some(body(worker.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleaned["status"], "Approved");

    let (status, _) = send(app(&env), Method::POST, &uri, Some(body(worker.id))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/admin/reports/{}/payments", report["id"].as_str().unwrap());
    let (status, payments) = send(app(&env), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payments.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_admin_review_flow_over_http() {
    let env = TestEnv::new().await.unwrap();
    let citizen = env.seed_user(Role::Citizen, None).await.unwrap();
    let worker = env.seed_user(Role::Worker, None).await.unwrap();
    let admin = env.seed_user(Role::Admin, None).await.unwrap();

    let (_, report) =
        send(app(&env), Method::POST, "/reports", Some(report_body(citizen.id))).await;
    let id = report["id"].as_str().unwrap().to_string();

    let (status, pending) = send(app(&env), Method::GET, "/admin/reports?status=Pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().map(Vec::len), Some(1));

    // a citizen cannot act as administrator
    let uri = format!("/admin/reports/{id}/verify");
    let (status, _) = send(
        app(&env),
        Method::POST,
        &uri,
        Some(json!({ "admin_id": citizen.id, "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, verified) = send(
        app(&env),
        Method::POST,
        &uri,
        Some(json!({ "admin_id": admin.id, "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["status"], "Verified");

    let (status, assigned) = send(
        app(&env),
        Method::POST,
        &format!("/admin/reports/{id}/assign"),
        Some(json!({ "admin_id": admin.id, "worker_id": worker.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["status"], "Assigned");
    assert_eq!(assigned["assigned_by_admin_id"], json!(admin.id));

    let (status, completed) = send(
        app(&env),
        Method::PATCH,
        &format!("/admin/reports/{id}/status"),
        Some(json!({ "admin_id": admin.id, "status": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "Completed");

    let (status, _) = send(
        app(&env),
        Method::POST,
        &format!("/admin/reports/{id}/reevaluate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reevaluate_reports_whether_scoring_ran() {
    let env = TestEnv::new().await.unwrap();
    let citizen = env.seed_user(Role::Citizen, None).await.unwrap();

    let (_, report) =
        send(app(&env), Method::POST, "/reports", Some(report_body(citizen.id))).await;
    let uri = format!("/admin/reports/{}/reevaluate", report["id"].as_str().unwrap());

    let (status, body) = send(app(&env), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evaluated"], false);
    assert_eq!(body["report"]["status"], "Pending");

    env.scoring.push_before(approve("api-3"));
    let (_, body) = send(app(&env), Method::POST, &uri, None).await;
    assert_eq!(body["evaluated"], true);
    assert_eq!(body["report"]["status"], "Verified");
}

#[tokio::test]
async fn test_notifications_list_and_mark_read() {
    let env = TestEnv::new().await.unwrap();
    let citizen = env.seed_user(Role::Citizen, None).await.unwrap();
    env.scoring.push_before(approve("api-4"));
    send(app(&env), Method::POST, "/reports", Some(report_body(citizen.id))).await;

    let uri = format!("/users/{}/notifications", citizen.id);
    let (status, notices) = send(app(&env), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notices[0]["kind"], "report_reviewed");
    assert_eq!(notices[0]["read"], false);

    let read_uri = format!("{uri}/{}/read", notices[0]["id"].as_str().unwrap());
    let (status, _) = send(app(&env), Method::POST, &read_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, notices) = send(app(&env), Method::GET, &uri, None).await;
    assert_eq!(notices[0]["read"], true);

    let other = env.seed_user(Role::Citizen, None).await.unwrap();
    let foreign = format!(
        "/users/{}/notifications/{}/read",
        other.id,
        notices[0]["id"].as_str().unwrap()
    );
    let (status, _) = send(app(&env), Method::POST, &foreign, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uploads_are_served_statically() {
    let env = TestEnv::new().await.unwrap();
    std::fs::write(env.upload_dir.join("note.txt"), b"uploaded").unwrap();

    let response = app(&env)
        .oneshot(Request::builder().uri("/uploads/note.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"uploaded");
}
