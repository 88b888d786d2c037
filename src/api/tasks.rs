use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::db::projects;
use crate::db::tasks::{self as repository, TaskFilter};
use crate::error::AppError;
use crate::models::{MoveRequest, NewTaskRequest, Task, TaskStatus, UpdateTaskRequest};
use crate::services::Board;
use crate::state::AppState;
use crate::validation::{ValidatedJson, ValidatedQuery};

async fn ensure_project_owned(db: &SqlitePool, user_id: &str, project_id: &str) -> Result<(), AppError> {
    match projects::find_project(db, user_id, project_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Unauthorized(
            "Project does not belong to the current user".to_string(),
        )),
    }
}

async fn find_owned_parent(db: &SqlitePool, user_id: &str, parent_id: &str) -> Result<Task, AppError> {
    repository::find_task(db, user_id, parent_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Parent task does not belong to the current user".to_string()))
}

pub(super) async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(filter): ValidatedQuery<TaskFilter>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = repository::fetch_tasks(&state.db, &auth.user_id, &filter).await?;
    Ok(Json(tasks))
}

pub(super) async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(mut req): ValidatedJson<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    if let Some(project_id) = &req.project_id {
        ensure_project_owned(&state.db, &auth.user_id, project_id).await?;
    }
    if let Some(parent_id) = &req.parent_id {
        let parent = find_owned_parent(&state.db, &auth.user_id, parent_id).await?;
        // subtasks live in their parent's project unless told otherwise
        if req.project_id.is_none() {
            req.project_id = parent.project_id;
        }
    }

    let task = repository::insert_task(&state.db, &auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub(super) async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = repository::find_task(&state.db, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

pub(super) async fn list_subtasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    if repository::find_task(&state.db, &auth.user_id, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let subtasks = repository::fetch_subtasks(&state.db, &auth.user_id, &id).await?;
    Ok(Json(subtasks))
}

pub(super) async fn update_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    if repository::find_task(&state.db, &auth.user_id, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if let Some(Some(project_id)) = &req.project_id {
        ensure_project_owned(&state.db, &auth.user_id, project_id).await?;
    }
    if let Some(Some(parent_id)) = &req.parent_id {
        find_owned_parent(&state.db, &auth.user_id, parent_id).await?;
        let chain = repository::ancestor_chain(&state.db, &auth.user_id, parent_id).await?;
        if chain.iter().any(|ancestor| ancestor == &id) {
            return Err(AppError::validation(
                "parent_id",
                "a task cannot be nested under itself or one of its subtasks",
            ));
        }
    }

    let task = repository::update_task(&state.db, &auth.user_id, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

pub(super) async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::delete_task(&state.db, &auth.user_id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

/// Drops the task into a status column of its board (same project and
/// parent) and returns that board.
pub(super) async fn move_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<MoveRequest<TaskStatus>>,
) -> Result<Json<BTreeMap<TaskStatus, Vec<Task>>>, AppError> {
    let task = repository::find_task(&state.db, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let project_id = task.project_id.as_deref();
    let parent_id = task.parent_id.as_deref();

    let scope = repository::fetch_scope(&state.db, &auth.user_id, project_id, parent_id).await?;
    let mut board = Board::from_cards(
        &TaskStatus::ALL,
        scope.iter().map(|t| (t.id.clone(), t.status, t.position)),
    );
    let placements = board
        .move_card(&id, req.status, req.index)
        .map_err(|_| AppError::NotFound)?;
    repository::apply_placements(&state.db, &auth.user_id, &placements).await?;

    let tasks = repository::fetch_scope(&state.db, &auth.user_id, project_id, parent_id).await?;
    let mut columns: BTreeMap<TaskStatus, Vec<Task>> =
        TaskStatus::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for task in tasks {
        columns.entry(task.status).or_default().push(task);
    }
    Ok(Json(columns))
}
