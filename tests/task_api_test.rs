mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{Value, json};

fn column_titles(board: &Value, column: &str) -> Vec<String> {
    board[column]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_task_round_trip() {
    let app = TestApp::new().await;
    let token = app.register("tasks@example.com").await;

    let (status, created) = app
        .post(
            "/api/tasks",
            &token,
            json!({
                "title": "File taxes",
                "description": "Before April",
                "priority": "urgent",
                "due_date": "2026-04-15"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "todo");

    let (status, fetched) = app.get(&format!("/api/tasks/{}", created["id"].as_str().unwrap()), &token).await;
    assert_eq!(status, StatusCode::OK);
    for field in ["title", "description", "priority", "due_date", "status", "position", "created_at"] {
        assert_eq!(fetched[field], created[field], "field {} differs", field);
    }
}

#[tokio::test]
async fn test_task_with_foreign_project_is_unauthorized() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let other = app.register("other@example.com").await;

    let (_, project) = app.post("/api/projects", &owner, json!({ "name": "Mine" })).await;
    let project_id = project["id"].as_str().unwrap();

    let (status, _) = app
        .post("/api/tasks", &other, json!({ "title": "Sneaky", "project_id": project_id }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/tasks", &owner, json!({ "title": "Legit", "project_id": project_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post("/api/tasks", &owner, json!({ "title": "Ghost", "project_id": "does-not-exist" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_validation() {
    let app = TestApp::new().await;
    let token = app.register("valid@example.com").await;

    let (status, body) = app.post("/api/tasks", &token, json!({ "title": "   " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "title");

    let (status, _) = app.post("/api/tasks", &token, json!({ "title": "x", "status": "someday" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_subtasks_inherit_project_and_reject_cycles() {
    let app = TestApp::new().await;
    let token = app.register("sub@example.com").await;

    let (_, project) = app.post("/api/projects", &token, json!({ "name": "House" })).await;
    let project_id = project["id"].as_str().unwrap();
    let (_, parent) = app
        .post("/api/tasks", &token, json!({ "title": "Paint", "project_id": project_id }))
        .await;
    let parent_id = parent["id"].as_str().unwrap();

    let (status, child) = app
        .post("/api/tasks", &token, json!({ "title": "Buy paint", "parent_id": parent_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(child["project_id"], project_id);
    let child_id = child["id"].as_str().unwrap();

    let (_, subtasks) = app.get(&format!("/api/tasks/{}/subtasks", parent_id), &token).await;
    assert_eq!(subtasks.as_array().unwrap().len(), 1);

    let (status, _) = app
        .patch(&format!("/api/tasks/{}", parent_id), &token, json!({ "parent_id": child_id }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .patch(&format!("/api/tasks/{}", parent_id), &token, json!({ "parent_id": parent_id }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post("/api/tasks", &token, json!({ "title": "Orphan", "parent_id": "missing" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, detached) = app
        .patch(&format!("/api/tasks/{}", child_id), &token, json!({ "parent_id": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detached["parent_id"], Value::Null);
}

#[tokio::test]
async fn test_completing_task_sets_completed_at() {
    let app = TestApp::new().await;
    let token = app.register("done@example.com").await;
    let (_, task) = app.post("/api/tasks", &token, json!({ "title": "Ship it" })).await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (_, done) = app.patch(&uri, &token, json!({ "status": "done" })).await;
    assert!(done["completed_at"].is_string());

    let (_, reopened) = app.patch(&uri, &token, json!({ "status": "todo" })).await;
    assert_eq!(reopened["completed_at"], Value::Null);
}

#[tokio::test]
async fn test_kanban_move_reassigns_positions() {
    let app = TestApp::new().await;
    let token = app.register("kanban@example.com").await;

    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        let (_, t) = app.post("/api/tasks", &token, json!({ "title": title })).await;
        ids.push(t["id"].as_str().unwrap().to_string());
    }
    let (_, doing) = app
        .post("/api/tasks", &token, json!({ "title": "doing", "status": "in_progress" }))
        .await;
    assert_eq!(doing["position"], 0);

    let (status, board) = app
        .post(&format!("/api/tasks/{}/move", ids[2]), &token, json!({ "status": "todo", "index": 0 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(column_titles(&board, "todo"), vec!["three", "one", "two"]);

    let (_, board) = app
        .post(&format!("/api/tasks/{}/move", ids[0]), &token, json!({ "status": "in_progress", "index": 99 }))
        .await;
    assert_eq!(column_titles(&board, "todo"), vec!["three", "two"]);
    assert_eq!(column_titles(&board, "in_progress"), vec!["doing", "one"]);
    let positions: Vec<_> = board["todo"].as_array().unwrap().iter().map(|t| t["position"].clone()).collect();
    assert_eq!(positions, vec![json!(0), json!(1)]);

    let (_, board) = app
        .post(&format!("/api/tasks/{}/move", ids[1]), &token, json!({ "status": "done", "index": 0 }))
        .await;
    assert!(board["done"][0]["completed_at"].is_string());

    let (status, _) = app
        .post("/api/tasks/unknown/move", &token, json!({ "status": "done", "index": 0 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters() {
    let app = TestApp::new().await;
    let token = app.register("filters@example.com").await;

    app.post("/api/tasks", &token, json!({ "title": "low", "priority": "low" })).await;
    app.post("/api/tasks", &token, json!({ "title": "high", "priority": "high" })).await;

    let (status, tasks) = app.get("/api/tasks?priority=high", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["title"], "high");
}

#[tokio::test]
async fn test_invalid_query_is_unprocessable() {
    let app = TestApp::new().await;
    let token = app.register("bad-query@example.com").await;

    let (status, body) = app.get("/api/tasks?status=someday", &token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "query");

    let (status, _) = app.get("/api/projects?status=dormant", &token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
