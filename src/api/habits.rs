use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::api::users::load_settings;
use crate::auth::AuthUser;
use crate::db::habits as repository;
use crate::error::AppError;
use crate::models::{
    Habit, HabitEntry, HabitWithStats, NewHabitRequest, ToggleEntryRequest, UpdateHabitRequest,
    UpsertEntryRequest,
};
use crate::services::habit_stats;
use crate::state::AppState;
use crate::validation::{ValidatedJson, ValidatedPath, ValidatedQuery};

#[derive(Deserialize)]
pub(super) struct HabitQueryParams {
    #[serde(default)]
    include_archived: bool,
}

#[derive(Deserialize)]
pub(super) struct EntryQueryParams {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

/// The server's local calendar day.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn with_stats(habit: Habit, entries: &[HabitEntry], today: NaiveDate, window_days: u32) -> HabitWithStats {
    let first_day = habit.created_at.with_timezone(&Local).date_naive();
    let stats = habit_stats::compute(entries, today, first_day, window_days);
    HabitWithStats { habit, stats }
}

async fn find_owned_habit(state: &AppState, user_id: &str, id: &str) -> Result<Habit, AppError> {
    repository::find_habit(&state.db, user_id, id)
        .await?
        .ok_or(AppError::NotFound)
}

async fn habit_with_stats(state: &AppState, user_id: &str, habit: Habit) -> Result<HabitWithStats, AppError> {
    let settings = load_settings(state, user_id).await?;
    let entries = repository::fetch_entries(&state.db, user_id, &habit.id, None, None).await?;
    Ok(with_stats(habit, &entries, today(), settings.habit_window_days))
}

pub(super) async fn list_habits(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(params): ValidatedQuery<HabitQueryParams>,
) -> Result<Json<Vec<HabitWithStats>>, AppError> {
    let settings = load_settings(&state, &auth.user_id).await?;
    let habits = repository::fetch_habits(&state.db, &auth.user_id, params.include_archived).await?;
    let entries = repository::fetch_entries_by_habit(&state.db, &auth.user_id).await?;
    let today = today();

    let habits = habits
        .into_iter()
        .map(|habit| {
            let habit_entries = entries.get(&habit.id).map(Vec::as_slice).unwrap_or(&[]);
            with_stats(habit, habit_entries, today, settings.habit_window_days)
        })
        .collect();
    Ok(Json(habits))
}

pub(super) async fn create_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<NewHabitRequest>,
) -> Result<(StatusCode, Json<HabitWithStats>), AppError> {
    let habit = repository::insert_habit(&state.db, &auth.user_id, req).await?;
    let habit = habit_with_stats(&state, &auth.user_id, habit).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub(super) async fn get_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<HabitWithStats>, AppError> {
    let habit = find_owned_habit(&state, &auth.user_id, &id).await?;
    Ok(Json(habit_with_stats(&state, &auth.user_id, habit).await?))
}

pub(super) async fn update_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateHabitRequest>,
) -> Result<Json<HabitWithStats>, AppError> {
    let habit = repository::update_habit(&state.db, &auth.user_id, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(habit_with_stats(&state, &auth.user_id, habit).await?))
}

pub(super) async fn delete_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::delete_habit(&state.db, &auth.user_id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

pub(super) async fn toggle_habit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedQuery(req): ValidatedQuery<ToggleEntryRequest>,
) -> Result<Json<HabitWithStats>, AppError> {
    let habit = find_owned_habit(&state, &auth.user_id, &id).await?;
    let date = req.date.unwrap_or_else(today);
    let entry = repository::toggle_entry(&state.db, &auth.user_id, &habit.id, date).await?;
    tracing::debug!("habit {} on {} completed={}", habit.id, date, entry.completed);
    Ok(Json(habit_with_stats(&state, &auth.user_id, habit).await?))
}

pub(super) async fn upsert_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath((id, date)): ValidatedPath<(String, NaiveDate)>,
    ValidatedJson(req): ValidatedJson<UpsertEntryRequest>,
) -> Result<Json<HabitEntry>, AppError> {
    let habit = find_owned_habit(&state, &auth.user_id, &id).await?;
    let entry = repository::upsert_entry(&state.db, &auth.user_id, &habit.id, date, req).await?;
    Ok(Json(entry))
}

pub(super) async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedQuery(params): ValidatedQuery<EntryQueryParams>,
) -> Result<Json<Vec<HabitEntry>>, AppError> {
    let habit = find_owned_habit(&state, &auth.user_id, &id).await?;
    let entries = repository::fetch_entries(&state.db, &auth.user_id, &habit.id, params.from, params.to).await?;
    Ok(Json(entries))
}
