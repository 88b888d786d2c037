mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, _) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/tasks", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired session");
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = TestApp::new().await;
    let token = app.register("beaver@example.com").await;

    let (status, me) = app.get("/api/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "beaver@example.com");

    let (status, _) = app
        .request(Method::POST, "/api/users", None, Some(json!({ "name": "Again", "email": "beaver@example.com" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, login) = app
        .request(Method::POST, "/api/sessions", None, Some(json!({ "email": "BEAVER@example.com" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let second = login["token"].as_str().unwrap().to_string();
    assert_ne!(second, token);

    let (status, _) = app.delete("/api/sessions/current", &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/api/users/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/users/me", &second).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(Method::POST, "/api/users", None, Some(json!({ "name": " ", "email": "nope" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"].as_array().map(Vec::len), Some(2));

    let (status, _) = app
        .request(Method::POST, "/api/users", None, Some(json!({ "name": "No email" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_settings_defaults_and_merge_patch() {
    let app = TestApp::new().await;
    let token = app.register("settings@example.com").await;

    let (status, settings) = app.get("/api/settings", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "system");
    assert_eq!(settings["pomodoro"]["focus_minutes"], 25);

    let (status, settings) = app
        .patch("/api/settings", &token, json!({ "theme": "dark", "pomodoro": { "focus_minutes": 50 } }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "dark");
    assert_eq!(settings["pomodoro"]["focus_minutes"], 50);
    assert_eq!(settings["pomodoro"]["short_break_minutes"], 5);

    let (_, reloaded) = app.get("/api/settings", &token).await;
    assert_eq!(reloaded, settings);

    let (status, _) = app
        .patch("/api/settings", &token, json!({ "pomodoro": { "focus_minutes": 0 } }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, unchanged) = app.get("/api/settings", &token).await;
    assert_eq!(unchanged["pomodoro"]["focus_minutes"], 50);
}

#[tokio::test]
async fn test_malformed_settings_patch_is_unprocessable() {
    let app = TestApp::new().await;
    let token = app.register("malformed@example.com").await;

    let (status, body) = app
        .request_raw(Method::PATCH, "/api/settings", Some(&token), Some("{not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "body");

    let (status, body) = app.patch("/api/settings", &token, json!(["dark"])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "body");
}
