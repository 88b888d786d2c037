use chrono::Utc;
use serde::Deserialize;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{NewProjectRequest, Project, ProjectStatus, UpdateProjectRequest};
use crate::services::Placement;

const PROJECT_COLUMNS: &str =
    "id, user_id, organization_id, name, description, status, color, position, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub organization_id: Option<String>,
    pub status: Option<ProjectStatus>,
}

pub async fn fetch_projects(
    db: &SqlitePool,
    user_id: &str,
    filter: &ProjectFilter,
) -> Result<Vec<Project>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM projects WHERE user_id = ", PROJECT_COLUMNS));
    qb.push_bind(user_id.to_string());
    if let Some(organization_id) = &filter.organization_id {
        qb.push(" AND organization_id = ").push_bind(organization_id.clone());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    qb.push(
        " ORDER BY CASE status WHEN 'planning' THEN 0 WHEN 'active' THEN 1 WHEN 'on_hold' THEN 2 ELSE 3 END, position, created_at",
    );

    qb.build_query_as::<Project>().fetch_all(db).await
}

pub async fn find_project(db: &SqlitePool, user_id: &str, id: &str) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects WHERE id = ? AND user_id = ?",
        PROJECT_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

async fn next_position(db: &SqlitePool, user_id: &str, status: ProjectStatus) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM projects WHERE user_id = ? AND status = ?",
    )
    .bind(user_id)
    .bind(status)
    .fetch_one(db)
    .await
}

/// Renumbers one status column 0..n, keeping its order.
async fn compact_column<'e, E>(executor: E, user_id: &str, status: ProjectStatus) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE projects
        SET position = (
            SELECT ranked.rn FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY position, created_at) - 1 AS rn
                FROM projects
                WHERE user_id = ?1 AND status = ?2
            ) AS ranked
            WHERE ranked.id = projects.id
        )
        WHERE user_id = ?1 AND status = ?2
        "#,
    )
    .bind(user_id)
    .bind(status)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn insert_project(
    db: &SqlitePool,
    user_id: &str,
    req: NewProjectRequest,
) -> Result<Project, sqlx::Error> {
    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        organization_id: req.organization_id,
        name: req.name.trim().to_string(),
        description: req.description,
        status: req.status,
        color: req.color,
        position: next_position(db, user_id, req.status).await?,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO projects
            (id, user_id, organization_id, name, description, status, color, position, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&project.id)
    .bind(&project.user_id)
    .bind(&project.organization_id)
    .bind(&project.name)
    .bind(&project.description)
    .bind(project.status)
    .bind(&project.color)
    .bind(project.position)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(db)
    .await?;

    Ok(project)
}

pub async fn update_project(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    req: UpdateProjectRequest,
) -> Result<Option<Project>, sqlx::Error> {
    let mut current = match find_project(db, user_id, id).await? {
        Some(p) => p,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name.trim().to_string();
    }
    if let Some(description) = req.description {
        current.description = description;
    }
    if let Some(organization_id) = req.organization_id {
        current.organization_id = organization_id;
    }
    if let Some(color) = req.color {
        current.color = color;
    }
    let previous_status = current.status;
    if let Some(status) = req.status {
        if status != current.status {
            current.position = next_position(db, user_id, status).await?;
            current.status = status;
        }
    }
    current.updated_at = Utc::now();

    let mut tx = db.begin().await?;
    sqlx::query(
        r#"
        UPDATE projects
        SET organization_id = ?, name = ?, description = ?, status = ?, color = ?,
            position = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&current.organization_id)
    .bind(&current.name)
    .bind(&current.description)
    .bind(current.status)
    .bind(&current.color)
    .bind(current.position)
    .bind(current.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if current.status != previous_status {
        compact_column(&mut *tx, user_id, previous_status).await?;
    }
    tx.commit().await?;

    Ok(Some(current))
}

pub async fn count_tasks(db: &SqlitePool, project_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE project_id = ?")
        .bind(project_id)
        .fetch_one(db)
        .await
}

pub async fn delete_project(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;
    let removed = sqlx::query_scalar::<_, ProjectStatus>(
        "DELETE FROM projects WHERE id = ? AND user_id = ? RETURNING status",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(status) = removed else {
        return Ok(false);
    };
    compact_column(&mut *tx, user_id, status).await?;
    tx.commit().await?;
    Ok(true)
}

/// `(id, status, position)` of every project the user owns.
pub async fn fetch_board_cards(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Vec<(String, ProjectStatus, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, ProjectStatus, i64)>(
        "SELECT id, status, position FROM projects WHERE user_id = ? ORDER BY position, created_at",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn apply_placements(
    db: &SqlitePool,
    user_id: &str,
    placements: &[Placement<ProjectStatus>],
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let mut tx = db.begin().await?;
    for placement in placements {
        sqlx::query(
            r#"
            UPDATE projects
            SET status = ?, position = ?,
                updated_at = CASE WHEN status != ? THEN ? ELSE updated_at END
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(placement.column)
        .bind(placement.position as i64)
        .bind(placement.column)
        .bind(now)
        .bind(&placement.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{setup_test_db, setup_test_user};

    fn new_project(name: &str, status: ProjectStatus) -> NewProjectRequest {
        NewProjectRequest {
            name: name.to_string(),
            description: None,
            organization_id: None,
            status,
            color: None,
        }
    }

    #[tokio::test]
    async fn test_positions_append_per_status() {
        let pool = setup_test_db().await;
        let user = setup_test_user(&pool, "p@example.com").await;

        let a = insert_project(&pool, &user.id, new_project("A", ProjectStatus::Active)).await.expect("insert failed");
        let b = insert_project(&pool, &user.id, new_project("B", ProjectStatus::Active)).await.expect("insert failed");
        let c = insert_project(&pool, &user.id, new_project("C", ProjectStatus::Planning)).await.expect("insert failed");

        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
        assert_eq!(c.position, 0);

        let filter = ProjectFilter {
            status: Some(ProjectStatus::Active),
            ..ProjectFilter::default()
        };
        let active = fetch_projects(&pool, &user.id, &filter).await.expect("query failed");
        let names: Vec<_> = active.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_status_change_moves_to_end_of_column() {
        let pool = setup_test_db().await;
        let user = setup_test_user(&pool, "p2@example.com").await;
        insert_project(&pool, &user.id, new_project("Done1", ProjectStatus::Completed)).await.expect("insert failed");
        let p = insert_project(&pool, &user.id, new_project("P", ProjectStatus::Active)).await.expect("insert failed");

        let updated = update_project(
            &pool,
            &user.id,
            &p.id,
            UpdateProjectRequest {
                status: Some(ProjectStatus::Completed),
                ..UpdateProjectRequest::default()
            },
        )
        .await
        .expect("update failed")
        .expect("Project not found");

        assert_eq!(updated.status, ProjectStatus::Completed);
        assert_eq!(updated.position, 1);
    }

    async fn active_positions(pool: &SqlitePool, user_id: &str) -> Vec<(String, i64)> {
        let filter = ProjectFilter {
            status: Some(ProjectStatus::Active),
            ..ProjectFilter::default()
        };
        fetch_projects(pool, user_id, &filter)
            .await
            .expect("query failed")
            .into_iter()
            .map(|p| (p.name, p.position))
            .collect()
    }

    #[tokio::test]
    async fn test_leaving_a_column_keeps_it_dense() {
        let pool = setup_test_db().await;
        let user = setup_test_user(&pool, "p3@example.com").await;
        let a = insert_project(&pool, &user.id, new_project("A", ProjectStatus::Active)).await.expect("insert failed");
        let b = insert_project(&pool, &user.id, new_project("B", ProjectStatus::Active)).await.expect("insert failed");
        insert_project(&pool, &user.id, new_project("C", ProjectStatus::Active)).await.expect("insert failed");

        update_project(
            &pool,
            &user.id,
            &a.id,
            UpdateProjectRequest {
                status: Some(ProjectStatus::OnHold),
                ..UpdateProjectRequest::default()
            },
        )
        .await
        .expect("update failed");
        assert_eq!(
            active_positions(&pool, &user.id).await,
            vec![("B".to_string(), 0), ("C".to_string(), 1)]
        );

        assert!(delete_project(&pool, &user.id, &b.id).await.expect("delete failed"));
        assert_eq!(active_positions(&pool, &user.id).await, vec![("C".to_string(), 0)]);
    }
}
