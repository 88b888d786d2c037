use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use crate::auth::AuthUser;
use crate::db::organizations as repository;
use crate::db::projects::{self, ProjectFilter};
use crate::error::AppError;
use crate::models::{NewOrganizationRequest, Organization, OrganizationSummary, Project, UpdateOrganizationRequest};
use crate::state::AppState;
use crate::validation::ValidatedJson;

pub(super) async fn list_organizations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<OrganizationSummary>>, AppError> {
    let organizations = repository::fetch_organizations(&state.db, &auth.user_id).await?;
    Ok(Json(organizations))
}

pub(super) async fn create_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<NewOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), AppError> {
    let organization = repository::insert_organization(&state.db, &auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

pub(super) async fn get_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Organization>, AppError> {
    let organization = repository::find_organization(&state.db, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(organization))
}

pub(super) async fn update_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateOrganizationRequest>,
) -> Result<Json<Organization>, AppError> {
    let organization = repository::update_organization(&state.db, &auth.user_id, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(organization))
}

pub(super) async fn delete_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::find_organization(&state.db, &auth.user_id, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let project_count = repository::count_projects(&state.db, &id).await?;
    if project_count > 0 {
        return Err(AppError::Conflict(format!(
            "Organization still has {} project(s); move or delete them first",
            project_count
        )));
    }

    repository::delete_organization(&state.db, &auth.user_id, &id).await?;
    info!("deleted organization {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_organization_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Project>>, AppError> {
    if repository::find_organization(&state.db, &auth.user_id, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let filter = ProjectFilter {
        organization_id: Some(id),
        ..ProjectFilter::default()
    };
    let projects = projects::fetch_projects(&state.db, &auth.user_id, &filter).await?;
    Ok(Json(projects))
}
