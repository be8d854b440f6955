//! API Integration Tests
//!
//! These tests drive the full router (auth middleware included) with
//! in-process requests against a temporary SQLite database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

use checkcx_admin::config::AuthSettings;
use checkcx_admin::db::Database;
use checkcx_admin::server::build_router;
use checkcx_admin::AppState;

// Test utilities
async fn setup_test_app() -> (Router, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let db = Database::new(&dir.path().join("test.db")).await.unwrap();

    let state = Arc::new(AppState {
        db,
        auth: AuthSettings::development(),
    });

    (build_router(state, false), dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_admin(app: &Router) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/setup/init",
        None,
        Some(json!({
            "username": "admin",
            "email": "admin@example.com",
            "password": "supersecret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
}

/// Create the first admin and log in
async fn login(app: &Router) -> String {
    create_admin(app).await;
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "identifier": "admin", "password": "supersecret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn config_body(name: &str, group: &str) -> Value {
    json!({
        "name": name,
        "type": "openai",
        "model": "gpt-4o-mini",
        "endpoint": "https://api.openai.com/v1/chat/completions",
        "api_key": "sk-test",
        "enabled": true,
        "group_name": group
    })
}

async fn create_config(app: &Router, token: &str, name: &str, group: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/configs",
        Some(token),
        Some(config_body(name, group)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

// =============================================================================
// Setup & Auth Tests
// =============================================================================

#[tokio::test]
async fn test_setup_status_fresh() {
    let (app, _dir) = setup_test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/setup/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_setup"], false);

    create_admin(&app).await;
    let (_, body) = send(&app, Method::GET, "/api/v1/setup/status", None, None).await;
    assert_eq!(body["is_setup"], true);
}

#[tokio::test]
async fn test_setup_init_validation() {
    let (app, _dir) = setup_test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/setup/init",
        None,
        Some(json!({ "username": "ad", "email": "admin@example.com", "password": "supersecret" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/setup/init",
        None,
        Some(json!({ "username": "admin", "email": "admin@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_setup_init_only_once() {
    let (app, _dir) = setup_test_app().await;
    create_admin(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/setup/init",
        None,
        Some(json!({ "username": "other", "email": "other@example.com", "password": "supersecret" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_by_email_and_bad_password() {
    let (app, _dir) = setup_test_app().await;
    create_admin(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "identifier": "admin@example.com", "password": "supersecret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["username"], "admin");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "identifier": "admin", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["token"].is_null());
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let (app, _dir) = setup_test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/configs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().starts_with("Unauthorized"));

    let (status, _) = send(&app, Method::GET, "/api/v1/dashboard", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_current_user_claims() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "admin@example.com");
    assert!(body["sub"].is_string());
    assert!(body["exp"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_unknown_api_path_is_json_404() {
    let (app, _dir) = setup_test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

// =============================================================================
// Check Config Tests
// =============================================================================

#[tokio::test]
async fn test_config_crud() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let created = create_config(&app, &token, "primary", "prod").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["type"], "openai");
    assert_eq!(created["group_name"], "prod");
    assert!(created.get("api_key").is_none());

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/configs/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "primary");

    let mut update = config_body("renamed", "");
    update["api_key"] = json!("");
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/configs/{}", id),
        Some(&token),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");
    assert!(body["group_name"].is_null());

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/configs/{}/maintenance", id),
        Some(&token),
        Some(json!({ "is_maintenance": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_maintenance"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/configs/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/configs/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_config_validation() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let mut body = config_body("primary", "");
    body["endpoint"] = json!("https://api.openai.com");
    let (status, _) = send(&app, Method::POST, "/api/v1/configs", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = config_body("primary", "");
    body["api_key"] = json!("  ");
    let (status, _) = send(&app, Method::POST, "/api/v1/configs", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_copy_config_reuses_key() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let source = create_config(&app, &token, "primary", "prod").await;
    let id = source["id"].as_str().unwrap();

    let mut copy = config_body("primary (copy)", "prod");
    copy["api_key"] = json!("");
    copy["enabled"] = json!(false);
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/configs/{}/copy", id),
        Some(&token),
        Some(copy),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_ne!(body["id"], source["id"]);
    assert_eq!(body["name"], "primary (copy)");
    assert_eq!(body["enabled"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/configs/missing/copy",
        Some(&token),
        Some(config_body("x", "")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_config_list_filters_and_pages() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    for i in 0..22 {
        create_config(&app, &token, &format!("bulk-{}", i), "prod").await;
    }
    create_config(&app, &token, "lonely", "").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/configs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 23);
    assert_eq!(body["per_page"], 20);
    assert_eq!(body["rows"].as_array().unwrap().len(), 20);
    // Newest first
    assert_eq!(body["rows"][0]["name"], "lonely");

    let (_, body) = send(&app, Method::GET, "/api/v1/configs?page=2", Some(&token), None).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["rows"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, Method::GET, "/api/v1/configs?page=0", Some(&token), None).await;
    assert_eq!(body["page"], 1);

    let (_, body) = send(&app, Method::GET, "/api/v1/configs?group=__ungrouped__", Some(&token), None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"][0]["name"], "lonely");

    let (_, body) = send(&app, Method::GET, "/api/v1/configs?group=prod", Some(&token), None).await;
    assert_eq!(body["total"], 22);

    let (_, body) = send(&app, Method::GET, "/api/v1/configs?q=LONE", Some(&token), None).await;
    assert_eq!(body["total"], 1);

    let (_, body) = send(&app, Method::GET, "/api/v1/configs?q=%25", Some(&token), None).await;
    assert_eq!(body["total"], 23);
}

#[tokio::test]
async fn test_config_list_bad_page_falls_back_to_first() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;
    create_config(&app, &token, "only", "").await;

    for page in ["abc", "", "2.5", "-1"] {
        let uri = format!("/api/v1/configs?page={}", page);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "page={}", page);
        assert_eq!(body["page"], 1);
        assert_eq!(body["rows"][0]["name"], "only");
    }
}

// =============================================================================
// Group Tests
// =============================================================================

#[tokio::test]
async fn test_group_lifecycle() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let (status, group) = send(
        &app,
        Method::POST,
        "/api/v1/groups",
        Some(&token),
        Some(json!({ "group_name": "prod", "website_url": "https://prod.example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = group["id"].as_str().unwrap().to_string();

    create_config(&app, &token, "primary", "prod").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/groups", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["group_name"], "prod");
    assert_eq!(body[0]["config_count"], 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/groups/{}", id),
        Some(&token),
        Some(json!({ "group_name": "prod", "website_url": "https://www.example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["website_url"], "https://www.example.com");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/groups/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/groups/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_duplicate_and_field_errors() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let body = json!({ "group_name": "prod", "website_url": "https://prod.example.com" });
    let (status, _) = send(&app, Method::POST, "/api/v1/groups", Some(&token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = send(&app, Method::POST, "/api/v1/groups", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "分组名称已存在");

    let (status, err) = send(
        &app,
        Method::POST,
        "/api/v1/groups",
        Some(&token),
        Some(json!({ "group_name": " ", "website_url": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["field_errors"]["group_name"].is_string());
    assert!(err["field_errors"]["website_url"].is_string());
}

// =============================================================================
// Notification Tests
// =============================================================================

#[tokio::test]
async fn test_notification_lifecycle() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/notifications",
        Some(&token),
        Some(json!({ "message": "   ", "level": "info" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/notifications",
        Some(&token),
        Some(json!({ "message": "Maintenance tonight", "level": "warning", "is_active": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["level"], "warning");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/notifications/{}/active", id),
        Some(&token),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, body) = send(&app, Method::GET, "/api/v1/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/notifications/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Dashboard Tests
// =============================================================================

#[tokio::test]
async fn test_dashboard_counts() {
    let (app, _dir) = setup_test_app().await;
    let token = login(&app).await;

    let first = create_config(&app, &token, "a", "").await;
    create_config(&app, &token, "b", "").await;
    send(
        &app,
        Method::PUT,
        &format!("/api/v1/configs/{}/enabled", first["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({ "enabled": false })),
    )
    .await;

    for i in 0..10 {
        send(
            &app,
            Method::POST,
            "/api/v1/groups",
            Some(&token),
            Some(json!({ "group_name": format!("group-{:02}", i), "website_url": "https://example.com" })),
        )
        .await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_configs"], 2);
    assert_eq!(body["enabled_configs"], 1);
    assert_eq!(body["disabled_configs"], 1);
    assert_eq!(body["maintenance_configs"], 0);
    assert_eq!(body["total_groups"], 10);
    assert_eq!(body["groups"].as_array().unwrap().len(), 8);
    assert_eq!(body["groups"][0]["name"], "group-00");
    assert_eq!(body["groups_remaining"], 2);
}
