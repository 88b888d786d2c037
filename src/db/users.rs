use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{NewUserRequest, User};

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

pub async fn insert_user(db: &SqlitePool, req: NewUserRequest) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();

    sqlx::query(
        "INSERT INTO users (id, name, email, settings, created_at, updated_at) VALUES (?, ?, ?, '{}', ?, ?)",
    )
    .bind(&id)
    .bind(&name)
    .bind(&email)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(User {
        id,
        name,
        email,
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await
}

pub async fn insert_session(db: &SqlitePool, user_id: &str) -> Result<String, sqlx::Error> {
    let token = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now())
        .execute(db)
        .await?;
    Ok(token)
}

pub async fn find_user_id_by_token(db: &SqlitePool, token: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT user_id FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(db)
        .await
}

pub async fn delete_session(db: &SqlitePool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}

/// Raw settings JSON as stored on the user row.
pub async fn fetch_settings(db: &SqlitePool, user_id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT settings FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn update_settings(db: &SqlitePool, user_id: &str, settings: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET settings = ?, updated_at = ? WHERE id = ?")
        .bind(settings)
        .bind(Utc::now())
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}
