use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::users::load_settings;
use crate::auth::AuthUser;
use crate::db::pomodoro as repository;
use crate::db::tasks;
use crate::error::AppError;
use crate::models::{ActiveSession, PomodoroSession, SessionKind, SessionStatus, StartSessionRequest};
use crate::services::pomodoro::{is_expired, next_kind, planned_end, planned_minutes, remaining_seconds};
use crate::state::AppState;
use crate::validation::{ValidatedJson, ValidatedQuery};

#[derive(Deserialize)]
pub(super) struct DayQueryParams {
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(super) struct PomodoroStats {
    date: NaiveDate,
    focus_sessions: u32,
    focus_minutes: i64,
    next_kind: SessionKind,
}

/// UTC bounds of a local calendar day.
fn local_day_range(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start_of = |d: NaiveDate| {
        d.and_hms_opt(0, 0, 0)
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
            .map(|local| local.with_timezone(&Utc))
    };
    let next = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::validation("date", "date is out of range"))?;
    match (start_of(date), start_of(next)) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(AppError::validation("date", "date has no local midnight")),
    }
}

/// The user's running session. One whose countdown already ran out is
/// completed at its planned end first, so it never blocks the next one.
async fn current_session(
    state: &AppState,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<PomodoroSession>, AppError> {
    let Some(session) = repository::find_running(&state.db, user_id).await? else {
        return Ok(None);
    };
    if !is_expired(&session, now) {
        return Ok(Some(session));
    }
    repository::finish_session(&state.db, user_id, &session.id, SessionStatus::Completed, planned_end(&session))
        .await?;
    debug!("completed expired session {}", session.id);
    Ok(None)
}

pub(super) async fn start_session(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<PomodoroSession>), AppError> {
    if let Some(task_id) = &req.task_id {
        if tasks::find_task(&state.db, &auth.user_id, task_id).await?.is_none() {
            return Err(AppError::Unauthorized(
                "Task does not belong to the current user".to_string(),
            ));
        }
    }
    if current_session(&state, &auth.user_id, Utc::now()).await?.is_some() {
        return Err(AppError::Conflict("A session is already running".to_string()));
    }

    let minutes = match req.planned_minutes {
        Some(minutes) => minutes,
        None => planned_minutes(req.kind, &load_settings(&state, &auth.user_id).await?.pomodoro),
    };
    let session = repository::insert_session(&state.db, &auth.user_id, req.task_id, req.kind, minutes).await?;
    info!("started {:?} session {} ({} min)", session.kind, session.id, minutes);
    Ok((StatusCode::CREATED, Json(session)))
}

async fn finish(state: &AppState, user_id: &str, id: &str, status: SessionStatus) -> Result<PomodoroSession, AppError> {
    if repository::find_session(&state.db, user_id, id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    repository::finish_session(&state.db, user_id, id, status, Utc::now())
        .await?
        .ok_or_else(|| AppError::Conflict("Session has already ended".to_string()))
}

pub(super) async fn complete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PomodoroSession>, AppError> {
    Ok(Json(finish(&state, &auth.user_id, &id, SessionStatus::Completed).await?))
}

pub(super) async fn cancel_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PomodoroSession>, AppError> {
    Ok(Json(finish(&state, &auth.user_id, &id, SessionStatus::Cancelled).await?))
}

pub(super) async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(params): ValidatedQuery<DayQueryParams>,
) -> Result<Json<Vec<PomodoroSession>>, AppError> {
    let range = params.date.map(local_day_range).transpose()?;
    current_session(&state, &auth.user_id, Utc::now()).await?;
    let sessions = repository::fetch_sessions(&state.db, &auth.user_id, range).await?;
    Ok(Json(sessions))
}

pub(super) async fn active_session(State(state): State<AppState>, auth: AuthUser) -> Result<Response, AppError> {
    let now = Utc::now();
    match current_session(&state, &auth.user_id, now).await? {
        Some(session) => {
            let remaining_seconds = remaining_seconds(&session, now);
            Ok(Json(ActiveSession { session, remaining_seconds }).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub(super) async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(params): ValidatedQuery<DayQueryParams>,
) -> Result<Json<PomodoroStats>, AppError> {
    let date = params.date.unwrap_or_else(|| Local::now().date_naive());
    let settings = load_settings(&state, &auth.user_id).await?;
    current_session(&state, &auth.user_id, Utc::now()).await?;
    let sessions = repository::fetch_sessions(&state.db, &auth.user_id, Some(local_day_range(date)?)).await?;

    let completed_focus: Vec<&PomodoroSession> = sessions
        .iter()
        .filter(|s| s.kind == SessionKind::Focus && s.status == SessionStatus::Completed)
        .collect();
    let focus_sessions = completed_focus.len() as u32;
    let focus_minutes = completed_focus
        .iter()
        .filter_map(|s| s.ended_at.map(|end| (end - s.started_at).num_minutes().min(s.planned_minutes)))
        .sum::<i64>();
    // sessions come back newest first
    let last = sessions
        .iter()
        .find(|s| s.status == SessionStatus::Completed)
        .map(|s| s.kind);

    Ok(Json(PomodoroStats {
        date,
        focus_sessions,
        focus_minutes,
        next_kind: next_kind(last, focus_sessions, settings.pomodoro.long_break_interval),
    }))
}
