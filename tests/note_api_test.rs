mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_note_round_trip() {
    let app = TestApp::new().await;
    let token = app.register("notes@example.com").await;

    let (status, created) = app
        .post("/api/notes", &token, json!({ "title": "Groceries", "content": "eggs, 100% rye" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["pinned"], false);
    let uri = format!("/api/notes/{}", created["id"].as_str().unwrap());

    let (_, fetched) = app.get(&uri, &token).await;
    for field in ["title", "content", "pinned", "created_at"] {
        assert_eq!(fetched[field], created[field], "field {} differs", field);
    }

    let (status, updated) = app.patch(&uri, &token, json!({ "pinned": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["pinned"], true);
    assert_eq!(updated["title"], "Groceries");

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_search_and_ordering() {
    let app = TestApp::new().await;
    let token = app.register("search@example.com").await;

    app.post("/api/notes", &token, json!({ "title": "Plain", "content": "nothing here" })).await;
    app.post("/api/notes", &token, json!({ "title": "Discount", "content": "50% off" })).await;
    app.post("/api/notes", &token, json!({ "title": "Pinned", "content": "top", "pinned": true })).await;

    let (_, all) = app.get("/api/notes", &token).await;
    assert_eq!(all[0]["title"], "Pinned");
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, hits) = app.get("/api/notes?q=%25", &token).await;
    let titles: Vec<_> = hits.as_array().unwrap().iter().map(|n| n["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Discount")]);

    let (_, pinned) = app.get("/api/notes?pinned=true", &token).await;
    assert_eq!(pinned.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_note_validation_and_privacy() {
    let app = TestApp::new().await;
    let owner = app.register("note-owner@example.com").await;
    let other = app.register("note-other@example.com").await;

    let (status, _) = app.post("/api/notes", &owner, json!({ "title": " " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, note) = app.post("/api/notes", &owner, json!({ "title": "Diary" })).await;
    let (status, _) = app.get(&format!("/api/notes/{}", note["id"].as_str().unwrap()), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
