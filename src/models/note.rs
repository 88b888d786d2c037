use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::validation::{MAX_NOTE_LEN, Rules, Validate};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
}

impl Validate for NewNoteRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .name("title", &self.title)
            .max_len("content", Some(&self.content), MAX_NOTE_LEN)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub pinned: Option<bool>,
}

impl Validate for UpdateNoteRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .optional_name("title", self.title.as_deref())
            .max_len("content", self.content.as_deref(), MAX_NOTE_LEN)
            .finish()
    }
}
