use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use crate::auth::AuthUser;
use crate::db::users as repository;
use crate::error::AppError;
use crate::models::settings::merge_patch;
use crate::models::{NewSessionRequest, NewUserRequest, SessionResponse, SettingsPatch, User, UserSettings};
use crate::state::AppState;
use crate::validation::{Validate, ValidatedJson};

pub(super) async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewUserRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    if repository::find_user_by_email(&state.db, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }
    let user = repository::insert_user(&state.db, req).await?;
    let token = repository::insert_session(&state.db, &user.id).await?;
    info!("registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

pub(super) async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let user = repository::find_user_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown account".to_string()))?;
    let token = repository::insert_session(&state.db, &user.id).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

pub(super) async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<StatusCode, AppError> {
    repository::delete_session(&state.db, &auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<User>, AppError> {
    let user = repository::find_user_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// Stored settings with defaults for anything missing.
pub(crate) async fn load_settings(state: &AppState, user_id: &str) -> Result<UserSettings, AppError> {
    let raw = repository::fetch_settings(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    match serde_json::from_str::<UserSettings>(&raw) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::warn!("stored settings for {} are unreadable, using defaults: {}", user_id, e);
            Ok(UserSettings::default())
        }
    }
}

pub(super) async fn get_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserSettings>, AppError> {
    Ok(Json(load_settings(&state, &auth.user_id).await?))
}

pub(super) async fn patch_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(SettingsPatch(patch)): ValidatedJson<SettingsPatch>,
) -> Result<Json<UserSettings>, AppError> {
    let current = load_settings(&state, &auth.user_id).await?;
    let mut merged = serde_json::to_value(&current).map_err(|_| AppError::InternalServerError)?;
    merge_patch(&mut merged, &patch);

    let settings: UserSettings = serde_json::from_value(merged)
        .map_err(|e| AppError::validation("body", e.to_string()))?;
    settings.validate()?;

    let raw = serde_json::to_string(&settings).map_err(|_| AppError::InternalServerError)?;
    repository::update_settings(&state.db, &auth.user_id, &raw).await?;
    Ok(Json(settings))
}
