use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{PomodoroSession, SessionKind, SessionStatus};

const SESSION_COLUMNS: &str = "id, user_id, task_id, kind, planned_minutes, started_at, ended_at, status";

pub async fn insert_session(
    db: &SqlitePool,
    user_id: &str,
    task_id: Option<String>,
    kind: SessionKind,
    planned_minutes: i64,
) -> Result<PomodoroSession, sqlx::Error> {
    let session = PomodoroSession {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        task_id,
        kind,
        planned_minutes,
        started_at: Utc::now(),
        ended_at: None,
        status: SessionStatus::Running,
    };

    sqlx::query(
        r#"
        INSERT INTO pomodoro_sessions (id, user_id, task_id, kind, planned_minutes, started_at, ended_at, status)
        VALUES (?, ?, ?, ?, ?, ?, NULL, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.task_id)
    .bind(session.kind)
    .bind(session.planned_minutes)
    .bind(session.started_at)
    .bind(session.status)
    .execute(db)
    .await?;

    Ok(session)
}

pub async fn find_session(db: &SqlitePool, user_id: &str, id: &str) -> Result<Option<PomodoroSession>, sqlx::Error> {
    sqlx::query_as::<_, PomodoroSession>(&format!(
        "SELECT {} FROM pomodoro_sessions WHERE id = ? AND user_id = ?",
        SESSION_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn find_running(db: &SqlitePool, user_id: &str) -> Result<Option<PomodoroSession>, sqlx::Error> {
    sqlx::query_as::<_, PomodoroSession>(&format!(
        "SELECT {} FROM pomodoro_sessions WHERE user_id = ? AND status = 'running'",
        SESSION_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Running sessions of every user, for the sweeper.
pub async fn fetch_all_running(db: &SqlitePool) -> Result<Vec<PomodoroSession>, sqlx::Error> {
    sqlx::query_as::<_, PomodoroSession>(&format!(
        "SELECT {} FROM pomodoro_sessions WHERE status = 'running'",
        SESSION_COLUMNS
    ))
    .fetch_all(db)
    .await
}

/// Sessions started within `[from, to)` when a range is given, newest first.
pub async fn fetch_sessions(
    db: &SqlitePool,
    user_id: &str,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Vec<PomodoroSession>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM pomodoro_sessions WHERE user_id = ",
        SESSION_COLUMNS
    ));
    qb.push_bind(user_id.to_string());
    if let Some((from, to)) = range {
        qb.push(" AND started_at >= ").push_bind(from);
        qb.push(" AND started_at < ").push_bind(to);
    }
    qb.push(" ORDER BY started_at DESC");

    qb.build_query_as::<PomodoroSession>().fetch_all(db).await
}

/// Ends a running session. `None` when it is missing or already ended.
pub async fn finish_session(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    status: SessionStatus,
    ended_at: DateTime<Utc>,
) -> Result<Option<PomodoroSession>, sqlx::Error> {
    sqlx::query_as::<_, PomodoroSession>(&format!(
        r#"
        UPDATE pomodoro_sessions
        SET status = ?, ended_at = ?
        WHERE id = ? AND user_id = ? AND status = 'running'
        RETURNING {}
        "#,
        SESSION_COLUMNS
    ))
    .bind(status)
    .bind(ended_at)
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{setup_test_db, setup_test_user};

    #[tokio::test]
    async fn test_only_one_running_session_per_user() {
        let pool = setup_test_db().await;
        let user = setup_test_user(&pool, "pomo@example.com").await;

        insert_session(&pool, &user.id, None, SessionKind::Focus, 25).await.expect("insert failed");
        let err = insert_session(&pool, &user.id, None, SessionKind::ShortBreak, 5)
            .await
            .expect_err("second running session should fail");
        assert!(err.as_database_error().is_some_and(|e| e.is_unique_violation()));
    }

    #[tokio::test]
    async fn test_finish_session_only_once() {
        let pool = setup_test_db().await;
        let user = setup_test_user(&pool, "finish@example.com").await;
        let session = insert_session(&pool, &user.id, None, SessionKind::Focus, 25).await.expect("insert failed");

        let done = finish_session(&pool, &user.id, &session.id, SessionStatus::Completed, Utc::now())
            .await
            .expect("update failed")
            .expect("session should be running");
        assert_eq!(done.status, SessionStatus::Completed);
        assert!(done.ended_at.is_some());

        let again = finish_session(&pool, &user.id, &session.id, SessionStatus::Cancelled, Utc::now())
            .await
            .expect("update failed");
        assert!(again.is_none());
        assert!(find_running(&pool, &user.id).await.expect("query failed").is_none());
    }
}
