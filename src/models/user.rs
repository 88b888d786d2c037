use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::validation::{Rules, Validate};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
    pub name: String,
    pub email: String,
}

impl Validate for NewUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .name("name", &self.name)
            .email("email", &self.email)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionRequest {
    pub email: String,
}

impl Validate for NewSessionRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new().email("email", &self.email).finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}
