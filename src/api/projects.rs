use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::AuthUser;
use crate::db::organizations;
use crate::db::projects::{self as repository, ProjectFilter};
use crate::error::AppError;
use crate::models::{MoveRequest, NewProjectRequest, Project, ProjectStatus, UpdateProjectRequest};
use crate::services::Board;
use crate::state::AppState;
use crate::validation::{ValidatedJson, ValidatedQuery};

async fn ensure_organization_owned(db: &SqlitePool, user_id: &str, organization_id: &str) -> Result<(), AppError> {
    match organizations::find_organization(db, user_id, organization_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Unauthorized(
            "Organization does not belong to the current user".to_string(),
        )),
    }
}

pub(super) async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(filter): ValidatedQuery<ProjectFilter>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = repository::fetch_projects(&state.db, &auth.user_id, &filter).await?;
    Ok(Json(projects))
}

pub(super) async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<NewProjectRequest>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    if let Some(organization_id) = &req.organization_id {
        ensure_organization_owned(&state.db, &auth.user_id, organization_id).await?;
    }
    let project = repository::insert_project(&state.db, &auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub(super) async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    let project = repository::find_project(&state.db, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(project))
}

pub(super) async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<Project>, AppError> {
    if let Some(Some(organization_id)) = &req.organization_id {
        ensure_organization_owned(&state.db, &auth.user_id, organization_id).await?;
    }
    let project = repository::update_project(&state.db, &auth.user_id, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(project))
}

pub(super) async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::find_project(&state.db, &auth.user_id, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let task_count = repository::count_tasks(&state.db, &id).await?;
    if task_count > 0 {
        return Err(AppError::Conflict(format!(
            "Project still has {} task(s); move or delete them first",
            task_count
        )));
    }

    repository::delete_project(&state.db, &auth.user_id, &id).await?;
    info!("deleted project {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Drops the project into a status column and returns the whole board.
pub(super) async fn move_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<MoveRequest<ProjectStatus>>,
) -> Result<Json<BTreeMap<ProjectStatus, Vec<Project>>>, AppError> {
    let cards = repository::fetch_board_cards(&state.db, &auth.user_id).await?;
    let mut board = Board::from_cards(&ProjectStatus::ALL, cards);
    let placements = board
        .move_card(&id, req.status, req.index)
        .map_err(|_| AppError::NotFound)?;
    repository::apply_placements(&state.db, &auth.user_id, &placements).await?;

    let projects = repository::fetch_projects(&state.db, &auth.user_id, &ProjectFilter::default()).await?;
    let mut columns: BTreeMap<ProjectStatus, Vec<Project>> =
        ProjectStatus::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for project in projects {
        columns.entry(project.status).or_default().push(project);
    }
    Ok(Json(columns))
}
