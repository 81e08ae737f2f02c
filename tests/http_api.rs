mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::*;
use rota_engine::{auth::issue_jwt, startup::build_router, AppConfig, AppState};

const SECRET: &str = "http-test-secret-0123456789";

fn config(metrics_key: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        regeneration_weeks: TEST_WEEKS,
        admin_role: "ADMIN".to_string(),
        run_migrations: false,
        metrics_key: metrics_key.map(str::to_string),
    }
}

fn app_with(rota: &Rota, metrics_key: Option<&str>) -> Router {
    let state = AppState::new(
        Arc::new(rota.store.clone()),
        Arc::new(rota.store.clone()),
        config(metrics_key),
        None,
    );
    build_router(Arc::new(state)).unwrap()
}

fn app(rota: &Rota) -> Router {
    app_with(rota, None)
}

fn token(employee_id: i32) -> String {
    issue_jwt(employee_id, SECRET, chrono::Duration::minutes(10)).unwrap()
}

fn request(method: &str, uri: &str, as_employee: Option<i32>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(employee_id) = as_employee {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(employee_id)));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn health_is_public() {
    let rota = rota();
    let (status, body) = send(&app(&rota), request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn request_ids_are_echoed() {
    let rota = rota();
    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app(&rota).oneshot(req).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let rota = rota();
    let app = app(&rota);

    let (status, body) = send(&app, request("GET", "/api/shifts", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UNAUTHORIZED");

    let forged = issue_jwt(ADMIN, "some-other-secret-entirely", chrono::Duration::minutes(10)).unwrap();
    let req = Request::builder()
        .uri("/api/shifts")
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signed correctly but not an employee.
    let (status, _) = send(&app, request("GET", "/api/shifts", Some(404), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let rota = rota();
    let req = Request::builder()
        .uri("/api/employees/me")
        .header(header::COOKIE, format!("theme=dark; __session={}", token(CARA)))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app(&rota), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employee_id"], CARA);
    assert_eq!(body["is_admin"], false);
    assert_eq!(body["roles"], json!(["DOCTOR", "NURSE"]));
}

#[tokio::test]
async fn catalog_writes_are_admin_only() {
    let rota = rota();
    let app = app(&rota);
    let early = json!({"name": "Early", "start_time": "07:00:00", "end_time": "15:00:00"});

    let (status, body) = send(&app, request("POST", "/api/shifts", Some(ANN), Some(early.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "FORBIDDEN");

    let (status, body) = send(&app, request("POST", "/api/shifts", Some(ADMIN), Some(early))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Early");
    assert_eq!(body["active"], true);

    let again = json!({"name": "EARLY", "start_time": "06:00:00", "end_time": "14:00:00"});
    let (status, body) = send(&app, request("POST", "/api/shifts", Some(ADMIN), Some(again))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "DUPLICATE_NAME");

    let (status, body) = send(&app, request("GET", "/api/shifts?size=500", Some(ANN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 200);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn swap_round_trip_over_http() {
    let rota = rota();
    let app = app(&rota);
    let morning = shift(&rota, "Morning", "07:00:00", "15:00:00").await;
    let evening = shift(&rota, "Evening", "15:00:00", "23:00:00").await;

    let (status, monday) = send(
        &app,
        request(
            "POST",
            "/api/schedules",
            Some(ADMIN),
            Some(json!({"employee_id": ANN, "work_date": "2025-03-03", "shift_id": morning.id})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(monday["origin"]["kind"], "MANUAL");

    let (_, wednesday) = send(
        &app,
        request(
            "POST",
            "/api/schedules",
            Some(ADMIN),
            Some(json!({"employee_id": BEN, "work_date": "2025-03-05", "shift_id": evening.id})),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/schedules",
            Some(ADMIN),
            Some(json!({"employee_id": ANN, "work_date": "2025-03-03", "shift_id": evening.id})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "DOUBLE_BOOKED");

    let (status, created) = send(
        &app,
        request(
            "POST",
            "/api/shift-changes",
            Some(ANN),
            Some(json!({
                "original_schedule_id": monday["id"],
                "target_schedule_id": wednesday["id"],
                "reason": "family event"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "PENDING");
    let id = created["id"].as_i64().unwrap();

    // Cara is neither party nor admin.
    let (status, _) = send(&app, request("GET", &format!("/api/shift-changes/{}", id), Some(CARA), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("POST", &format!("/api/shift-changes/{}/admin-approve", id), Some(ADMIN), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "INVALID_STATE");

    let (status, _) = send(
        &app,
        request("POST", &format!("/api/shift-changes/{}/approve", id), Some(CARA), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("POST", &format!("/api/shift-changes/{}/approve", id), Some(BEN), Some(json!({"message": "ok"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target_status"], "APPROVED");

    let (status, _) = send(
        &app,
        request("POST", &format!("/api/shift-changes/{}/admin-approve", id), Some(BEN), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, queue) = send(&app, request("GET", "/api/shift-changes/approvals", Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        &app,
        request("POST", &format!("/api/shift-changes/{}/admin-approve", id), Some(ADMIN), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");

    let (status, rows) = send(
        &app,
        request("GET", "/api/schedules/by-date?date=2025-03-03", Some(ANN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows[0]["employee_id"], BEN);
}

#[tokio::test]
async fn regeneration_over_http_reports_counts() {
    let rota = rota();
    let app = app(&rota);
    let early = shift(&rota, "Early", "07:00:00", "15:00:00").await;

    let (status, created) = send(
        &app,
        request(
            "POST",
            "/api/patterns",
            Some(ADMIN),
            Some(json!({
                "employee_id": ANN,
                "name": "Ann days",
                "shifts": [{"week_number": 1, "day_of_week": 1, "shift_id": early.id}]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["active"], true);
    let id = created["id"].as_i64().unwrap();

    let (status, report) = send(
        &app,
        request(
            "POST",
            &format!("/api/patterns/{}/regenerate", id),
            Some(ADMIN),
            Some(json!({"start_date": "2025-03-03"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["created"], 2);
    assert_eq!(report["end_date"], "2025-04-28");

    let (status, body) = send(&app, request("DELETE", &format!("/api/patterns/{}", id), Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CONFLICT");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/patterns/{}?confirm=true", id), Some(ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("GET", "/api/schedules?start=2025-03-10&end=2025-03-01", Some(ANN), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "VALIDATION");
}

#[tokio::test]
async fn employees_see_only_their_own_patterns() {
    let rota = rota();
    let app = app(&rota);
    let early = shift(&rota, "Early", "07:00:00", "15:00:00").await;
    pattern(&rota, BEN, vec![cell(1, 1, early.id)]).await;

    let (status, _) = send(&app, request("GET", &format!("/api/employees/{}/patterns", BEN), Some(ANN), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("GET", &format!("/api/employees/{}/patterns/active", BEN), Some(BEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employee_id"], BEN);
}

#[tokio::test]
async fn metrics_key_guards_the_endpoint() {
    let rota = rota();
    let app = app_with(&rota, Some("scrape-me"));

    let (status, _) = send(&app, request("GET", "/metrics", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Right key, but no recorder is installed in tests.
    let req = Request::builder()
        .uri("/metrics")
        .header("X-Metrics-Key", "scrape-me")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let rota = rota();
    let (status, body) = send(&app(&rota), request("GET", "/api-docs/openapi.json", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/shift-changes/{id}/admin-approve"].is_object());
}

#[tokio::test]
async fn api_reference_page_is_served() {
    let rota = rota();
    let response = app(&rota)
        .oneshot(request("GET", "/scalar", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8_lossy(&bytes);
    assert!(page.contains("/api/shift-changes/{id}/admin-approve"));
}
