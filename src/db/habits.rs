use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{Habit, HabitEntry, NewHabitRequest, UpdateHabitRequest, UpsertEntryRequest};

const HABIT_COLUMNS: &str = "id, user_id, name, description, color, frequency, archived, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, habit_id, user_id, date, completed, note, created_at, updated_at";

pub async fn fetch_habits(db: &SqlitePool, user_id: &str, include_archived: bool) -> Result<Vec<Habit>, sqlx::Error> {
    let archived_clause = if include_archived { "" } else { " AND archived = 0" };
    sqlx::query_as::<_, Habit>(&format!(
        "SELECT {} FROM habits WHERE user_id = ?{} ORDER BY created_at",
        HABIT_COLUMNS, archived_clause
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_habit(db: &SqlitePool, user_id: &str, id: &str) -> Result<Option<Habit>, sqlx::Error> {
    sqlx::query_as::<_, Habit>(&format!("SELECT {} FROM habits WHERE id = ? AND user_id = ?", HABIT_COLUMNS))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_habit(db: &SqlitePool, user_id: &str, req: NewHabitRequest) -> Result<Habit, sqlx::Error> {
    let now = Utc::now();
    let habit = Habit {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: req.name.trim().to_string(),
        description: req.description,
        color: req.color,
        frequency: req.frequency,
        archived: false,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO habits (id, user_id, name, description, color, frequency, archived, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&habit.id)
    .bind(&habit.user_id)
    .bind(&habit.name)
    .bind(&habit.description)
    .bind(&habit.color)
    .bind(habit.frequency)
    .bind(habit.created_at)
    .bind(habit.updated_at)
    .execute(db)
    .await?;

    Ok(habit)
}

pub async fn update_habit(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    req: UpdateHabitRequest,
) -> Result<Option<Habit>, sqlx::Error> {
    let mut current = match find_habit(db, user_id, id).await? {
        Some(h) => h,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name.trim().to_string();
    }
    if let Some(description) = req.description {
        current.description = description;
    }
    if let Some(color) = req.color {
        current.color = color;
    }
    if let Some(frequency) = req.frequency {
        current.frequency = frequency;
    }
    if let Some(archived) = req.archived {
        current.archived = archived;
    }
    current.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE habits
        SET name = ?, description = ?, color = ?, frequency = ?, archived = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&current.name)
    .bind(&current.description)
    .bind(&current.color)
    .bind(current.frequency)
    .bind(current.archived)
    .bind(current.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_habit(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM habits WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}

pub async fn fetch_entries(
    db: &SqlitePool,
    user_id: &str,
    habit_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<HabitEntry>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM habit_entries WHERE user_id = ", ENTRY_COLUMNS));
    qb.push_bind(user_id.to_string());
    qb.push(" AND habit_id = ").push_bind(habit_id.to_string());
    if let Some(from) = from {
        qb.push(" AND date >= ").push_bind(from);
    }
    if let Some(to) = to {
        qb.push(" AND date <= ").push_bind(to);
    }
    qb.push(" ORDER BY date");

    qb.build_query_as::<HabitEntry>().fetch_all(db).await
}

/// All of a user's entries grouped by habit id.
pub async fn fetch_entries_by_habit(
    db: &SqlitePool,
    user_id: &str,
) -> Result<HashMap<String, Vec<HabitEntry>>, sqlx::Error> {
    let entries = sqlx::query_as::<_, HabitEntry>(&format!(
        "SELECT {} FROM habit_entries WHERE user_id = ? ORDER BY date",
        ENTRY_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<String, Vec<HabitEntry>> = HashMap::new();
    for entry in entries {
        grouped.entry(entry.habit_id.clone()).or_default().push(entry);
    }
    Ok(grouped)
}

/// Flips the day's entry, creating a completed one when none exists.
pub async fn toggle_entry(
    db: &SqlitePool,
    user_id: &str,
    habit_id: &str,
    date: NaiveDate,
) -> Result<HabitEntry, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, HabitEntry>(&format!(
        r#"
        INSERT INTO habit_entries (id, habit_id, user_id, date, completed, note, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 1, NULL, ?5, ?5)
        ON CONFLICT (habit_id, user_id, date)
        DO UPDATE SET completed = NOT completed, updated_at = excluded.updated_at
        RETURNING {}
        "#,
        ENTRY_COLUMNS
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(habit_id)
    .bind(user_id)
    .bind(date)
    .bind(now)
    .fetch_one(db)
    .await
}

pub async fn upsert_entry(
    db: &SqlitePool,
    user_id: &str,
    habit_id: &str,
    date: NaiveDate,
    req: UpsertEntryRequest,
) -> Result<HabitEntry, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, HabitEntry>(&format!(
        r#"
        INSERT INTO habit_entries (id, habit_id, user_id, date, completed, note, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        ON CONFLICT (habit_id, user_id, date)
        DO UPDATE SET completed = excluded.completed, note = excluded.note, updated_at = excluded.updated_at
        RETURNING {}
        "#,
        ENTRY_COLUMNS
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(habit_id)
    .bind(user_id)
    .bind(date)
    .bind(req.completed)
    .bind(req.note)
    .bind(now)
    .fetch_one(db)
    .await
}
