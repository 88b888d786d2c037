use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{NewNoteRequest, Note, UpdateNoteRequest};

const NOTE_COLUMNS: &str = "id, user_id, title, content, pinned, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteFilter {
    pub q: Option<String>,
    pub pinned: Option<bool>,
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub async fn fetch_notes(db: &SqlitePool, user_id: &str, filter: &NoteFilter) -> Result<Vec<Note>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM notes WHERE user_id = ", NOTE_COLUMNS));
    qb.push_bind(user_id.to_string());
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR content LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(pinned) = filter.pinned {
        qb.push(" AND pinned = ").push_bind(pinned);
    }
    qb.push(" ORDER BY pinned DESC, updated_at DESC");

    qb.build_query_as::<Note>().fetch_all(db).await
}

pub async fn find_note(db: &SqlitePool, user_id: &str, id: &str) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!("SELECT {} FROM notes WHERE id = ? AND user_id = ?", NOTE_COLUMNS))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_note(db: &SqlitePool, user_id: &str, req: NewNoteRequest) -> Result<Note, sqlx::Error> {
    let now = Utc::now();
    let note = Note {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: req.title.trim().to_string(),
        content: req.content,
        pinned: req.pinned,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO notes (id, user_id, title, content, pinned, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&note.id)
    .bind(&note.user_id)
    .bind(&note.title)
    .bind(&note.content)
    .bind(note.pinned)
    .bind(note.created_at)
    .bind(note.updated_at)
    .execute(db)
    .await?;

    Ok(note)
}

pub async fn update_note(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    req: UpdateNoteRequest,
) -> Result<Option<Note>, sqlx::Error> {
    let mut current = match find_note(db, user_id, id).await? {
        Some(n) => n,
        None => return Ok(None),
    };

    if let Some(title) = req.title {
        current.title = title.trim().to_string();
    }
    if let Some(content) = req.content {
        current.content = content;
    }
    if let Some(pinned) = req.pinned {
        current.pinned = pinned;
    }
    current.updated_at = Utc::now();

    sqlx::query("UPDATE notes SET title = ?, content = ?, pinned = ?, updated_at = ? WHERE id = ? AND user_id = ?")
        .bind(&current.title)
        .bind(&current.content)
        .bind(current.pinned)
        .bind(current.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

pub async fn delete_note(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{setup_test_db, setup_test_user};

    fn new_note(title: &str, content: &str, pinned: bool) -> NewNoteRequest {
        NewNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
            pinned,
        }
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_pinned_first() {
        let pool = setup_test_db().await;
        let user = setup_test_user(&pool, "n@example.com").await;

        insert_note(&pool, &user.id, new_note("Shopping", "eggs, Flour", false)).await.expect("insert failed");
        insert_note(&pool, &user.id, new_note("Recipes", "bread needs flour", true)).await.expect("insert failed");
        insert_note(&pool, &user.id, new_note("Ideas", "a beaver app", false)).await.expect("insert failed");

        let filter = NoteFilter {
            q: Some("FLOUR".to_string()),
            pinned: None,
        };
        let notes = fetch_notes(&pool, &user.id, &filter).await.expect("query failed");
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Recipes", "Shopping"]);
    }

    #[tokio::test]
    async fn test_search_escapes_wildcards() {
        let pool = setup_test_db().await;
        let user = setup_test_user(&pool, "w@example.com").await;
        insert_note(&pool, &user.id, new_note("Progress", "50% done", false)).await.expect("insert failed");
        insert_note(&pool, &user.id, new_note("Other", "500 done", false)).await.expect("insert failed");

        let filter = NoteFilter {
            q: Some("50%".to_string()),
            pinned: None,
        };
        let notes = fetch_notes(&pool, &user.id, &filter).await.expect("query failed");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Progress");
    }
}
