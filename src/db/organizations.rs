use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{NewOrganizationRequest, Organization, OrganizationSummary, UpdateOrganizationRequest};

const ORGANIZATION_COLUMNS: &str = "id, user_id, name, description, color, created_at, updated_at";

pub async fn fetch_organizations(db: &SqlitePool, user_id: &str) -> Result<Vec<OrganizationSummary>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationSummary>(
        r#"
        SELECT
            o.id, o.user_id, o.name, o.description, o.color, o.created_at, o.updated_at,
            (SELECT COUNT(*) FROM projects p WHERE p.organization_id = o.id) AS project_count
        FROM organizations o
        WHERE o.user_id = ?
        ORDER BY o.name COLLATE NOCASE, o.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_organization(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {} FROM organizations WHERE id = ? AND user_id = ?",
        ORGANIZATION_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_organization(
    db: &SqlitePool,
    user_id: &str,
    req: NewOrganizationRequest,
) -> Result<Organization, sqlx::Error> {
    let organization = Organization {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: req.name.trim().to_string(),
        description: req.description,
        color: req.color,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO organizations (id, user_id, name, description, color, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&organization.id)
    .bind(&organization.user_id)
    .bind(&organization.name)
    .bind(&organization.description)
    .bind(&organization.color)
    .bind(organization.created_at)
    .bind(organization.updated_at)
    .execute(db)
    .await?;

    Ok(organization)
}

pub async fn update_organization(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    req: UpdateOrganizationRequest,
) -> Result<Option<Organization>, sqlx::Error> {
    let mut current = match find_organization(db, user_id, id).await? {
        Some(o) => o,
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
    current.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE organizations
        SET name = ?, description = ?, color = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&current.name)
    .bind(&current.description)
    .bind(&current.color)
    .bind(current.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn count_projects(db: &SqlitePool, organization_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE organization_id = ?")
        .bind(organization_id)
        .fetch_one(db)
        .await
}

pub async fn delete_organization(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM organizations WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}
