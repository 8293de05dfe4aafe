//! API integration tests
//!
//! The router is driven in-process over the in-memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use agenda_server::{
    api::create_router,
    config::{AppConfig, StorageBackend},
    models::{Booking, NewBooking},
    repository::MemoryRepository,
    AppState,
};

const COMPANY: &str = "acme";

fn app(repo: Arc<MemoryRepository>) -> Router {
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;
    create_router(AppState::new(config, repo))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(format!("/api/v1{}", uri));
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).expect("Failed to build request"))
        .await
        .expect("Failed to send request");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, value)
}

/// 09:00-17:00 every day, so tests do not depend on the weekday they run on
fn every_day() -> Value {
    let open = json!({ "active": true, "blocks": [{ "start": "09:00", "end": "17:00" }] });
    json!({
        "days": {
            "sunday": open, "monday": open, "tuesday": open, "wednesday": open,
            "thursday": open, "friday": open, "saturday": open
        },
        "minimum_gap_minutes": 0
    })
}

fn stale_booking(date: NaiveDate, time: &str) -> Booking {
    NewBooking {
        professional_id: "pro-1".to_string(),
        professional_name: "Ana".to_string(),
        client_id: None,
        client_name: "Client".to_string(),
        service_name: "Haircut".to_string(),
        service_duration: 60,
        service_price: Decimal::new(5000, 2),
        date,
        time: time.to_string(),
    }
    .into_booking(COMPANY, Uuid::new_v4(), Utc::now())
}

async fn setup() -> (Arc<MemoryRepository>, Router) {
    let repo = Arc::new(MemoryRepository::new());
    let app = app(repo.clone());
    let (status, _) = send(
        &app,
        Method::PUT,
        "/companies/acme/professionals/pro-1/working-hours",
        Some(every_day()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (repo, app)
}

fn next_week() -> NaiveDate {
    Local::now().date_naive() + Duration::days(7)
}

#[tokio::test]
async fn test_health_check() {
    let app = app(Arc::new(MemoryRepository::new()));

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_working_hours_round_trip() {
    let (_, app) = setup().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/companies/acme/professionals/pro-1/working-hours",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"]["monday"]["blocks"][0]["end"], "17:00");

    let (status, body) = send(
        &app,
        Method::GET,
        "/companies/acme/professionals/nobody/working-hours",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_invalid_working_hours_rejected() {
    let (_, app) = setup().await;
    let bad = json!({
        "days": { "monday": { "active": true, "blocks": [{ "start": "17:00", "end": "09:00" }] } }
    });
    let (status, _) = send(
        &app,
        Method::PUT,
        "/companies/acme/professionals/pro-1/working-hours",
        Some(bad),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut huge_gap = every_day();
    huge_gap["minimum_gap_minutes"] = json!(u32::MAX);
    let (status, _) = send(
        &app,
        Method::PUT,
        "/companies/acme/professionals/pro-1/working-hours",
        Some(huge_gap),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_then_slot_disappears() {
    let (_, app) = setup().await;
    let date = next_week();
    let slots_uri = format!("/companies/acme/professionals/pro-1/slots?date={}&duration=60", date);

    let (status, body) = send(&app, Method::GET, &slots_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 8);
    assert_eq!(slots[0], "09:00");

    let request = json!({
        "professional_id": "pro-1",
        "professional_name": "Ana",
        "client_id": "client-7",
        "client_name": "Bruno",
        "services": [
            { "name": "Cut", "duration_minutes": 30, "price": "30.00" },
            { "name": "Beard", "duration_minutes": 30, "price": "15.00" }
        ],
        "date": date,
        "time": "10:00"
    });
    let (status, created) = send(&app, Method::POST, "/companies/acme/bookings", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "active");
    assert_eq!(created["service_name"], "Cut + Beard");
    assert_eq!(created["service_duration"], 60);

    let (_, body) = send(&app, Method::GET, &slots_uri, None).await;
    let slots: Vec<&str> = body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(!slots.contains(&"10:00"));
    assert_eq!(slots.len(), 7);

    // Same slot again
    let (status, body) = send(&app, Method::POST, "/companies/acme/bookings", Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SlotUnavailable");
}

#[tokio::test]
async fn test_zero_duration_is_bad_request() {
    let (_, app) = setup().await;
    let uri = format!(
        "/companies/acme/professionals/pro-1/slots?date={}&duration=0",
        next_week()
    );
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let uri = format!(
        "/companies/acme/professionals/pro-1/slots?date={}&duration={}",
        next_week(),
        u32::MAX
    );
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_status_transitions() {
    let (repo, app) = setup().await;
    let booking = stale_booking(next_week(), "09:00");
    let id = booking.id;
    repo.insert_booking(booking).await;

    let uri = format!("/companies/acme/bookings/{}/status", id);
    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "status": "cancelled_by_client" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled_by_client");

    // Re-applying the same terminal status is accepted
    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "status": "cancelled_by_client" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InvalidTransition");

    let missing = format!("/companies/acme/bookings/{}/status", Uuid::new_v4());
    let (status, _) = send(&app, Method::PUT, &missing, Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_agenda_views() {
    let (repo, app) = setup().await;
    let today = Local::now().date_naive();
    repo.insert_booking(stale_booking(today - Duration::days(3), "09:00")).await;
    repo.insert_booking(stale_booking(today - Duration::days(1), "09:00")).await;
    repo.insert_booking(stale_booking(today, "11:00")).await;

    let uri = format!("/companies/acme/bookings?date={}", today);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["time"], "11:00");
    assert!(body[0]["expired"].is_boolean());

    let uri = format!("/companies/acme/bookings?mode=history&date={}", today);
    let (_, body) = send(&app, Method::GET, &uri, None).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["date"], json!(today - Duration::days(1)));
    assert_eq!(entries[0]["expired"], true);
}

#[tokio::test]
async fn test_summary_endpoints() {
    let (repo, app) = setup().await;
    let date = next_week();
    repo.insert_booking(stale_booking(date, "09:00")).await;
    repo.insert_booking(stale_booking(date, "11:00")).await;

    let (status, body) = send(&app, Method::GET, &format!("/companies/acme/summary?date={}", date), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["pending"], 2);
    assert_eq!(body["largest_idle_gap"]["minutes"], 60);

    let (status, body) = send(&app, Method::POST, "/companies/acme/summary", Some(json!([]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["narrative"][0], "• No appointments for this day");
}

#[tokio::test]
async fn test_reconciliation_session() {
    let (repo, app) = setup().await;
    let today = Local::now().date_naive();
    let older = stale_booking(today - Duration::days(5), "09:00");
    let absent = stale_booking(today - Duration::days(2), "09:00");
    let present = stale_booking(today - Duration::days(2), "10:00");
    let (older_id, absent_id, present_id) = (older.id, absent.id, present.id);
    for booking in [older, absent, present] {
        repo.insert_booking(booking).await;
    }

    let (status, body) = send(&app, Method::POST, "/companies/acme/reconciliation", None).await;
    assert_eq!(status, StatusCode::OK);
    let session = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(body["prompt"]["date"], json!(today - Duration::days(5)));

    let (status, body) = send(&app, Method::POST, &format!("/reconciliation/{}/finalize", session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["completed"], json!([older_id]));
    assert_eq!(body["next"]["date"], json!(today - Duration::days(2)));
    assert_eq!(body["next"]["pending_bookings"].as_array().unwrap().len(), 2);

    let uri = format!("/reconciliation/{}/bookings/{}/no-show", session, absent_id);
    let (status, body) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending_bookings"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::POST, &format!("/reconciliation/{}/finalize", session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["completed"], json!([present_id]));
    assert!(body["next"].is_null());

    // Chain finished, the session is gone
    let (status, _) = send(&app, Method::DELETE, &format!("/reconciliation/{}", session), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::POST, "/companies/acme/reconciliation", None).await;
    assert!(body["session_id"].is_null());
}

#[tokio::test]
async fn test_reconciliation_dismiss() {
    let (repo, app) = setup().await;
    let today = Local::now().date_naive();
    let booking = stale_booking(today - Duration::days(1), "09:00");
    let id = booking.id;
    repo.insert_booking(booking).await;

    let (_, body) = send(&app, Method::POST, "/companies/acme/reconciliation", None).await;
    let session = body["session_id"].as_str().unwrap().to_string();

    // A second operator cannot open a parallel session for the same company
    let (status, body) = send(&app, Method::POST, "/companies/acme/reconciliation", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ReconciliationBusy");

    let (status, _) = send(&app, Method::DELETE, &format!("/reconciliation/{}", session), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let uri = format!("/companies/acme/bookings?date={}", today - Duration::days(1));
    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body[0]["id"], json!(id));
    assert_eq!(body[0]["status"], "active");
}
