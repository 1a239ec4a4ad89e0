//! Integration tests: the full router over an in-memory SQLite database.

use asset_tracker::auth::{Claims, TokenService};
use asset_tracker::models::Role;
use asset_tracker::{create_app, db, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::util::ServiceExt;

const JWT_SECRET: &str = "test-jwt-secret-min-32-chars!!!!";

async fn test_app() -> axum::Router {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::init_schema(&pool).await.unwrap();
    create_app(AppState::new(pool, TokenService::new(JWT_SECRET, 30).unwrap()))
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, token, body, &[]).await
}

async fn send_with_headers(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &axum::Router, username: &str, role: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123",
            "role": role,
        })),
    )
    .await
}

async fn login(app: &axum::Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

async fn token_for(app: &axum::Router, username: &str, role: &str) -> String {
    let (status, _) = register(app, username, role).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = login(app, username, "password123").await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "asset-tracker");
}

#[tokio::test]
async fn register_and_login() {
    let app = test_app().await;

    let (status, user) = register(&app, "joao", "standard").await;
    assert_eq!(status, StatusCode::CREATED, "register should succeed");
    assert_eq!(user["username"], "joao");
    assert_eq!(user["role"], "standard");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let (status, body) = login(&app, "joao", "password123").await;
    assert_eq!(status, StatusCode::OK, "login should succeed");
    assert_eq!(body["token_type"], "Bearer");
    let token = body["access_token"].as_str().unwrap();

    let claims = TokenService::new(JWT_SECRET, 30)
        .unwrap()
        .validate(token).unwrap();
    assert_eq!(claims.username, "joao");

    let (status, me) = send(&app, "GET", "/users/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "joao@example.com");
}

#[tokio::test]
async fn duplicate_registration_is_refused() {
    let app = test_app().await;
    assert_eq!(register(&app, "joao", "standard").await.0, StatusCode::CREATED);
    assert_eq!(register(&app, "joao", "standard").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_distinguished() {
    let app = test_app().await;
    register(&app, "joao", "standard").await;

    let (status, _) = login(&app, "nobody", "password123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = login(&app, "joao", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn protected_routes_need_a_valid_bearer_token() {
    let app = test_app().await;

    let (status, _) = send(&app, "GET", "/equipment", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/equipment", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = token_for(&app, "joao", "standard").await;
    let (status, body) = send(&app, "GET", "/equipment", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn standard_user_is_forbidden_from_admin_routes() {
    let app = test_app().await;
    let token = token_for(&app, "joao", "standard").await;

    let (status, _) = send(&app, "GET", "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/equipment",
        Some(&token),
        Some(json!({ "code": "CAM-001", "name": "Camera", "category": "video" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/reports/audit-log", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn withdrawal_and_return_flow() {
    let app = test_app().await;
    let admin = token_for(&app, "admin", "admin").await;
    let operator = token_for(&app, "operator", "standard").await;

    let (status, equipment) = send(
        &app,
        "POST",
        "/equipment",
        Some(&admin),
        Some(json!({
            "code": "CAM-001",
            "name": "Camera",
            "category": "video",
            "qr_code": "QR-CAM-001",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(equipment["status"], "available");
    let equipment_id = equipment["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/equipment",
        Some(&admin),
        Some(json!({ "code": "CAM-001", "name": "Other", "category": "video" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "duplicate code");

    let start = Utc::now() + Duration::days(1);
    let (status, event) = send(
        &app,
        "POST",
        "/events",
        Some(&admin),
        Some(json!({
            "code": "EV-001",
            "name": "Conference",
            "event_type": "corporate",
            "start_date": start.to_rfc3339(),
            "end_date": (start + Duration::days(2)).to_rfc3339(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["status"], "planned");
    assert_eq!(event["color"], "#3b82f6");
    let event_id = event["id"].as_str().unwrap().to_string();

    let withdrawal = json!({
        "equipment_id": equipment_id,
        "event_id": event_id,
        "transaction_type": "withdrawal",
    });
    let (status, tx) = send(
        &app,
        "POST",
        "/transactions",
        Some(&operator),
        Some(withdrawal.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tx["status"], "completed");
    let tx_id = tx["id"].as_str().unwrap().to_string();

    let (_, item) = send(
        &app,
        "GET",
        "/equipment/qr/QR-CAM-001",
        Some(&operator),
        None,
    )
    .await;
    assert_eq!(item["status"], "in_use");

    let (_, ev) = send(&app, "GET", "/events/code/EV-001", Some(&operator), None).await;
    assert_eq!(ev["status"], "in_progress");

    let (status, body) = send(&app, "POST", "/transactions", Some(&operator), Some(withdrawal)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "item already out");
    assert!(body["error"].as_str().unwrap().contains("EV-001"));

    let (status, body) = send(&app, "DELETE", &format!("/transactions/{}", tx_id), Some(&operator), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "completed transactions stay");
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/transactions",
        Some(&operator),
        Some(json!({
            "equipment_id": equipment_id,
            "event_id": event_id,
            "transaction_type": "return",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, item) = send(&app, "GET", "/equipment/code/CAM-001", Some(&operator), None).await;
    assert_eq!(item["status"], "available");

    let (status, list) = send(
        &app,
        "GET",
        "/transactions?type=return",
        Some(&operator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, summary) = send(&app, "GET", "/reports/audit-log/summary", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 4);
    let tables = summary["by_table"].as_array().unwrap();
    assert!(tables
        .iter()
        .any(|t| t["table"] == "transactions" && t["count"] == 2));
    assert!(summary["by_action"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["action"] == "INSERT" && a["count"] == 2));

    let (status, usage) = send(&app, "GET", "/reports/equipment-usage", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage["by_category"], json!([{ "category": "video", "count": 1 }]));
    assert_eq!(usage["by_status"], json!([{ "status": "available", "count": 1 }]));

    let (status, dashboard) = send(&app, "GET", "/reports/dashboard", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["equipment"]["available"], 1);
    assert_eq!(dashboard["transactions"]["completed"], 2);
    assert_eq!(dashboard["users"]["total"], 2);
}

#[tokio::test]
async fn event_dates_must_be_ordered() {
    let app = test_app().await;
    let admin = token_for(&app, "admin", "admin").await;
    let start = Utc::now();
    let (status, _) = send(
        &app,
        "POST",
        "/events",
        Some(&admin),
        Some(json!({
            "code": "EV-BAD",
            "name": "Backwards",
            "event_type": "corporate",
            "start_date": start.to_rfc3339(),
            "end_date": (start - Duration::days(1)).to_rfc3339(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivated_user_loses_access() {
    let app = test_app().await;
    let admin = token_for(&app, "admin", "admin").await;
    let token = token_for(&app, "joao", "standard").await;
    let (_, me) = send(&app, "GET", "/users/me", Some(&token), None).await;
    let id = me["id"].as_str().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/users/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn create_equipment(app: &axum::Router, admin: &str, code: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/equipment",
        Some(admin),
        Some(json!({ "code": code, "name": "Item", "category": "audio" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_event(app: &axum::Router, admin: &str, code: &str, status: Option<&str>) -> Value {
    let start = Utc::now() + Duration::days(1);
    let mut body = json!({
        "code": code,
        "name": "Show",
        "event_type": "music",
        "start_date": start.to_rfc3339(),
        "end_date": (start + Duration::days(2)).to_rfc3339(),
    });
    if let Some(s) = status {
        body["status"] = json!(s);
    }
    let (code, event) = send(app, "POST", "/events", Some(admin), Some(body)).await;
    assert_eq!(code, StatusCode::CREATED);
    event
}

#[tokio::test]
async fn transaction_update_and_cancel() {
    let app = test_app().await;
    let admin = token_for(&app, "admin", "admin").await;
    let equipment_id = create_equipment(&app, &admin, "MIC-001").await;
    let event = create_event(&app, &admin, "EV-010", None).await;

    let (status, tx) = send(
        &app,
        "POST",
        "/transactions",
        Some(&admin),
        Some(json!({
            "equipment_id": equipment_id,
            "event_id": event["id"],
            "transaction_type": "withdrawal",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/transactions/{}", tx["id"].as_str().unwrap());
    let stamped = tx["actual_date"].clone();
    assert!(stamped.is_string());

    let (status, reopened) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({ "status": "pending", "notes": "recount" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["status"], "pending");
    assert_eq!(reopened["notes"], "recount");

    // Completing again keeps the original timestamp.
    let (status, done) = send(&app, "PUT", &uri, Some(&admin), Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["actual_date"], stamped);

    send(&app, "PUT", &uri, Some(&admin), Some(json!({ "status": "pending" }))).await;
    let (status, body) = send(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, cancelled) = send(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/transactions/{}", uuid::Uuid::new_v4()),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn forwarded_client_address_lands_in_audit_log() {
    let app = test_app().await;
    let admin = token_for(&app, "admin", "admin").await;
    let equipment_id = create_equipment(&app, &admin, "MIC-002").await;
    let event = create_event(&app, &admin, "EV-011", None).await;

    let (status, _) = send_with_headers(
        &app,
        "POST",
        "/transactions",
        Some(&admin),
        Some(json!({
            "equipment_id": equipment_id,
            "event_id": event["id"],
            "transaction_type": "withdrawal",
        })),
        &[("x-forwarded-for", "203.0.113.9, 10.0.0.1")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, rows) = send(
        &app,
        "GET",
        "/reports/audit-log?table_name=transactions",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["ip_address"], "203.0.113.9");
    assert_eq!(rows[0]["action"], "INSERT");
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let app = test_app().await;
    let token = token_for(&app, "joao", "standard").await;
    let (_, me) = send(&app, "GET", "/users/me", Some(&token), None).await;

    let past = Utc::now() - Duration::hours(2);
    let claims = Claims {
        sub: me["id"].as_str().unwrap().to_string(),
        username: "joao".to_string(),
        role: Role::Standard,
        iat: past.timestamp(),
        exp: (past + Duration::minutes(30)).timestamp(),
    };
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = send(&app, "GET", "/users/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn bag_lifecycle_and_bag_movements() {
    let app = test_app().await;
    let admin = token_for(&app, "admin", "admin").await;
    let operator = token_for(&app, "operator", "standard").await;
    let mic = create_equipment(&app, &admin, "MIC-010").await;
    let cable = create_equipment(&app, &admin, "CAB-010").await;

    let (status, bag) = send(
        &app,
        "POST",
        "/bags",
        Some(&admin),
        Some(json!({ "code": "BAG-01", "name": "Stage kit" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bag["status"], "available");
    assert_eq!(bag["equipment_count"], 0);
    let bag_id = bag["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/bags",
        Some(&admin),
        Some(json!({ "code": "BAG-01", "name": "Copy" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bag code already exists");

    let (status, _) = send(&app, "POST", "/bags", Some(&operator), Some(json!({ "code": "BAG-02", "name": "x" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Codes are matched without regard to case.
    let (status, bag) = send(&app, "POST", &format!("/bags/{bag_id}/equipment/mic-010"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bag["equipment_count"], 1);
    let (status, bag) = send(&app, "POST", &format!("/bags/{bag_id}/equipment/CAB-010"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bag["equipment_count"], 2);

    let (status, _) = send(&app, "POST", &format!("/bags/{bag_id}/equipment/CAB-010"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "already in this bag");
    let (status, _) = send(&app, "POST", &format!("/bags/{bag_id}/equipment/NOPE"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, other) = send(
        &app,
        "POST",
        "/bags",
        Some(&admin),
        Some(json!({ "code": "BAG-02", "name": "Spare kit" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(
        &app,
        "POST",
        &format!("/bags/{}/equipment/MIC-010", other["id"].as_str().unwrap()),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("BAG-01"));

    let (status, detail) = send(&app, "GET", "/bags/code/BAG-01", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["equipment_items"].as_array().unwrap().len(), 2);

    let event = create_event(&app, &admin, "EV-020", None).await;
    let (status, tx) = send(
        &app,
        "POST",
        "/transactions",
        Some(&operator),
        Some(json!({
            "bag_id": bag_id,
            "event_id": event["id"],
            "transaction_type": "withdrawal",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tx["bag_id"], bag_id.as_str());
    assert_eq!(tx["equipment_id"], Value::Null);

    let (_, detail) = send(&app, "GET", &format!("/bags/{bag_id}"), Some(&operator), None).await;
    assert_eq!(detail["status"], "in_use");
    for item in detail["equipment_items"].as_array().unwrap() {
        assert_eq!(item["status"], "in_use");
    }
    let (_, rows) = send(&app, "GET", "/reports/audit-log?table_name=equipment", Some(&admin), None).await;
    assert_eq!(rows.as_array().unwrap().len(), 2, "one row per item");

    let (status, _) = send(
        &app,
        "POST",
        "/transactions",
        Some(&operator),
        Some(json!({
            "equipment_id": mic,
            "bag_id": bag_id,
            "event_id": event["id"],
            "transaction_type": "return",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "exactly one target");

    let (status, _) = send(
        &app,
        "POST",
        "/transactions",
        Some(&operator),
        Some(json!({
            "bag_id": bag_id,
            "event_id": event["id"],
            "transaction_type": "return",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, detail) = send(&app, "GET", &format!("/bags/{bag_id}"), Some(&operator), None).await;
    assert_eq!(detail["status"], "available");

    let (status, _) = send(&app, "DELETE", &format!("/bags/{bag_id}/equipment/{cable}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/bags/{bag_id}/equipment/{cable}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no longer in the bag");

    let (status, _) = send(&app, "DELETE", &format!("/bags/{bag_id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = send(&app, "GET", "/bags", Some(&operator), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1, "excluded bags are hidden");
    let (_, list) = send(&app, "GET", "/bags?status=excluded", Some(&operator), None).await;
    assert_eq!(list[0]["code"], "BAG-01");
}

#[tokio::test]
async fn reservation_flow() {
    let app = test_app().await;
    let admin = token_for(&app, "admin", "admin").await;
    let operator = token_for(&app, "operator", "standard").await;
    let mic = create_equipment(&app, &admin, "MIC-030").await;
    let planned = create_event(&app, &admin, "EV-030", None).await;
    let confirmed = create_event(&app, &admin, "EV-031", Some("confirmed")).await;

    let reserve = |event: &Value| {
        json!({
            "equipment_id": mic,
            "event_id": event["id"],
            "start_date": event["start_date"],
            "end_date": event["end_date"],
        })
    };

    let (status, _) = send(&app, "POST", "/reservations", Some(&operator), Some(reserve(&confirmed))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "POST", "/reservations", Some(&admin), Some(reserve(&planned))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "planned events take no reservations");

    let (status, reservation) = send(&app, "POST", "/reservations", Some(&admin), Some(reserve(&confirmed))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reservation["status"], "active");
    let uri = format!("/reservations/{}", reservation["id"].as_str().unwrap());

    let (_, item) = send(&app, "GET", "/equipment/code/MIC-030", Some(&operator), None).await;
    assert_eq!(item["status"], "reserved");

    let (status, list) = send(
        &app,
        "GET",
        &format!("/reservations?event_id={}", confirmed["id"].as_str().unwrap()),
        Some(&operator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, item) = send(&app, "GET", "/equipment/code/MIC-030", Some(&operator), None).await;
    assert_eq!(item["status"], "available");

    let (status, body) = send(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only active reservations can be cancelled");

    // A second active booking over the same dates conflicts once the item is free again.
    let (status, second) = send(&app, "POST", "/reservations", Some(&admin), Some(reserve(&confirmed))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/equipment/{mic}"),
        Some(&admin),
        Some(json!({ "status": "available" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "POST", "/reservations", Some(&admin), Some(reserve(&confirmed))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflicting reservation exists for the specified dates");

    let (status, done) = send(
        &app,
        "PUT",
        &format!("/reservations/{}", second["id"].as_str().unwrap()),
        Some(&admin),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");
}
