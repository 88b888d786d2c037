use chrono::Utc;
use serde::Deserialize;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{NewTaskRequest, Task, TaskPriority, TaskStatus, UpdateTaskRequest};
use crate::services::Placement;

const TASK_COLUMNS: &str = "id, user_id, project_id, parent_id, title, description, status, priority, \
    due_date, position, completed_at, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<String>,
    pub parent_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Only tasks without a parent.
    #[serde(default)]
    pub top_level: bool,
}

pub async fn fetch_tasks(db: &SqlitePool, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM tasks WHERE user_id = ", TASK_COLUMNS));
    qb.push_bind(user_id.to_string());
    if let Some(project_id) = &filter.project_id {
        qb.push(" AND project_id = ").push_bind(project_id.clone());
    }
    if let Some(parent_id) = &filter.parent_id {
        qb.push(" AND parent_id = ").push_bind(parent_id.clone());
    } else if filter.top_level {
        qb.push(" AND parent_id IS NULL");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    qb.push(
        " ORDER BY CASE status WHEN 'todo' THEN 0 WHEN 'in_progress' THEN 1 ELSE 2 END, position, created_at",
    );

    qb.build_query_as::<Task>().fetch_all(db).await
}

pub async fn find_task(db: &SqlitePool, user_id: &str, id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ? AND user_id = ?", TASK_COLUMNS))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_subtasks(db: &SqlitePool, user_id: &str, parent_id: &str) -> Result<Vec<Task>, sqlx::Error> {
    let filter = TaskFilter {
        parent_id: Some(parent_id.to_string()),
        ..TaskFilter::default()
    };
    fetch_tasks(db, user_id, &filter).await
}

/// Ids from `id` up through its parents, `id` first.
pub async fn ancestor_chain(db: &SqlitePool, user_id: &str, id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        WITH RECURSIVE chain(id, parent_id, depth) AS (
            SELECT id, parent_id, 0 FROM tasks WHERE id = ?1 AND user_id = ?2
            UNION ALL
            SELECT t.id, t.parent_id, c.depth + 1
            FROM tasks t JOIN chain c ON t.id = c.parent_id
            WHERE t.user_id = ?2 AND c.depth < 1000
        )
        SELECT id FROM chain ORDER BY depth
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Next free slot at the end of a status column. A column is scoped by
/// project and parent, so subtasks order among their siblings.
async fn next_position(
    db: &SqlitePool,
    user_id: &str,
    project_id: Option<&str>,
    parent_id: Option<&str>,
    status: TaskStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(MAX(position) + 1, 0) FROM tasks
        WHERE user_id = ? AND project_id IS ? AND parent_id IS ? AND status = ?
        "#,
    )
    .bind(user_id)
    .bind(project_id)
    .bind(parent_id)
    .bind(status)
    .fetch_one(db)
    .await
}

/// Renumbers one status column 0..n, keeping its order.
async fn compact_column<'e, E>(
    executor: E,
    user_id: &str,
    project_id: Option<&str>,
    parent_id: Option<&str>,
    status: TaskStatus,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE tasks
        SET position = (
            SELECT ranked.rn FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY position, created_at) - 1 AS rn
                FROM tasks
                WHERE user_id = ?1 AND project_id IS ?2 AND parent_id IS ?3 AND status = ?4
            ) AS ranked
            WHERE ranked.id = tasks.id
        )
        WHERE user_id = ?1 AND project_id IS ?2 AND parent_id IS ?3 AND status = ?4
        "#,
    )
    .bind(user_id)
    .bind(project_id)
    .bind(parent_id)
    .bind(status)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn insert_task(db: &SqlitePool, user_id: &str, req: NewTaskRequest) -> Result<Task, sqlx::Error> {
    let now = Utc::now();
    let position = next_position(
        db,
        user_id,
        req.project_id.as_deref(),
        req.parent_id.as_deref(),
        req.status,
    )
    .await?;

    let task = Task {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        project_id: req.project_id,
        parent_id: req.parent_id,
        title: req.title.trim().to_string(),
        description: req.description,
        status: req.status,
        priority: req.priority,
        due_date: req.due_date,
        position,
        completed_at: (req.status == TaskStatus::Done).then_some(now),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, user_id, project_id, parent_id, title, description, status, priority,
            due_date, position, completed_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.user_id)
    .bind(&task.project_id)
    .bind(&task.parent_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(task.position)
    .bind(task.completed_at)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(db)
    .await?;

    Ok(task)
}

pub async fn update_task(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    req: UpdateTaskRequest,
) -> Result<Option<Task>, sqlx::Error> {
    let mut current = match find_task(db, user_id, id).await? {
        Some(t) => t,
        None => return Ok(None),
    };
    let previous = current.clone();
    let now = Utc::now();

    if let Some(title) = req.title {
        current.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        current.description = description;
    }
    if let Some(project_id) = req.project_id {
        current.project_id = project_id;
    }
    if let Some(parent_id) = req.parent_id {
        current.parent_id = parent_id;
    }
    if let Some(status) = req.status {
        current.status = status;
    }
    if let Some(priority) = req.priority {
        current.priority = priority;
    }
    if let Some(due_date) = req.due_date {
        current.due_date = due_date;
    }

    let moved = current.status != previous.status
        || current.project_id != previous.project_id
        || current.parent_id != previous.parent_id;
    if moved {
        current.position = next_position(
            db,
            user_id,
            current.project_id.as_deref(),
            current.parent_id.as_deref(),
            current.status,
        )
        .await?;
    }

    current.completed_at = if current.status == TaskStatus::Done {
        previous.completed_at.or(Some(now))
    } else {
        None
    };
    current.updated_at = now;

    let mut tx = db.begin().await?;
    sqlx::query(
        r#"
        UPDATE tasks
        SET project_id = ?, parent_id = ?, title = ?, description = ?, status = ?, priority = ?,
            due_date = ?, position = ?, completed_at = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&current.project_id)
    .bind(&current.parent_id)
    .bind(&current.title)
    .bind(&current.description)
    .bind(current.status)
    .bind(current.priority)
    .bind(current.due_date)
    .bind(current.position)
    .bind(current.completed_at)
    .bind(current.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if moved {
        compact_column(
            &mut *tx,
            user_id,
            previous.project_id.as_deref(),
            previous.parent_id.as_deref(),
            previous.status,
        )
        .await?;
    }
    tx.commit().await?;

    Ok(Some(current))
}

/// Deletes the task (and, by cascade, its subtasks) and closes the gap it
/// leaves in its column.
pub async fn delete_task(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;
    let removed = sqlx::query_as::<_, (Option<String>, Option<String>, TaskStatus)>(
        "DELETE FROM tasks WHERE id = ? AND user_id = ? RETURNING project_id, parent_id, status",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((project_id, parent_id, status)) = removed else {
        return Ok(false);
    };
    compact_column(&mut *tx, user_id, project_id.as_deref(), parent_id.as_deref(), status).await?;
    tx.commit().await?;
    Ok(true)
}

/// Tasks sharing a board: same project, same parent.
pub async fn fetch_scope(
    db: &SqlitePool,
    user_id: &str,
    project_id: Option<&str>,
    parent_id: Option<&str>,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {} FROM tasks
        WHERE user_id = ? AND project_id IS ? AND parent_id IS ?
        ORDER BY position, created_at
        "#,
        TASK_COLUMNS
    ))
    .bind(user_id)
    .bind(project_id)
    .bind(parent_id)
    .fetch_all(db)
    .await
}

pub async fn apply_placements(
    db: &SqlitePool,
    user_id: &str,
    placements: &[Placement<TaskStatus>],
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let mut tx = db.begin().await?;
    for placement in placements {
        sqlx::query(
            r#"
            UPDATE tasks
            SET status = ?1,
                position = ?2,
                completed_at = CASE WHEN ?1 = 'done' THEN COALESCE(completed_at, ?3) ELSE NULL END,
                updated_at = CASE WHEN status != ?1 THEN ?3 ELSE updated_at END
            WHERE id = ?4 AND user_id = ?5
            "#,
        )
        .bind(placement.column)
        .bind(placement.position as i64)
        .bind(now)
        .bind(&placement.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}
