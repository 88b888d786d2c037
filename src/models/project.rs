use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::validation::{MAX_DESCRIPTION_LEN, Rules, Validate};

use super::double_option;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Planning,
        ProjectStatus::Active,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub organization_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub color: Option<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub color: Option<String>,
}

impl Validate for NewProjectRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .name("name", &self.name)
            .max_len("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
            .color("color", self.color.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub organization_id: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
}

impl Validate for UpdateProjectRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .optional_name("name", self.name.as_deref())
            .max_len("description", self.description.clone().flatten().as_deref(), MAX_DESCRIPTION_LEN)
            .color("color", self.color.clone().flatten().as_deref())
            .finish()
    }
}
