use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::AuthUser;
use crate::db::notes::{self as repository, NoteFilter};
use crate::error::AppError;
use crate::models::{NewNoteRequest, Note, UpdateNoteRequest};
use crate::state::AppState;
use crate::validation::{ValidatedJson, ValidatedQuery};

pub(super) async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(filter): ValidatedQuery<NoteFilter>,
) -> Result<Json<Vec<Note>>, AppError> {
    let notes = repository::fetch_notes(&state.db, &auth.user_id, &filter).await?;
    Ok(Json(notes))
}

pub(super) async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<NewNoteRequest>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let note = repository::insert_note(&state.db, &auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub(super) async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Note>, AppError> {
    let note = repository::find_note(&state.db, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(note))
}

pub(super) async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateNoteRequest>,
) -> Result<Json<Note>, AppError> {
    let note = repository::update_note(&state.db, &auth.user_id, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(note))
}

pub(super) async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::delete_note(&state.db, &auth.user_id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
