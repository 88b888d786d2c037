use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::validation::{MAX_DESCRIPTION_LEN, Rules, Validate};

use super::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub organization: Organization,
    pub project_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganizationRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl Validate for NewOrganizationRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .name("name", &self.name)
            .max_len("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
            .color("color", self.color.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
}

impl Validate for UpdateOrganizationRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .optional_name("name", self.name.as_deref())
            .max_len("description", self.description.clone().flatten().as_deref(), MAX_DESCRIPTION_LEN)
            .color("color", self.color.clone().flatten().as_deref())
            .finish()
    }
}
