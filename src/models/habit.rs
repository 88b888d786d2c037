use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::validation::{MAX_DESCRIPTION_LEN, Rules, Validate};

use super::double_option;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub frequency: HabitFrequency,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HabitEntry {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HabitStats {
    pub completed_today: bool,
    pub streak: u32,
    pub longest_streak: u32,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitWithStats {
    #[serde(flatten)]
    pub habit: Habit,
    pub stats: HabitStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabitRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub frequency: HabitFrequency,
}

impl Validate for NewHabitRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .name("name", &self.name)
            .max_len("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
            .color("color", self.color.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
    pub frequency: Option<HabitFrequency>,
    pub archived: Option<bool>,
}

impl Validate for UpdateHabitRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .optional_name("name", self.name.as_deref())
            .max_len("description", self.description.clone().flatten().as_deref(), MAX_DESCRIPTION_LEN)
            .color("color", self.color.clone().flatten().as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToggleEntryRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertEntryRequest {
    pub completed: bool,
    pub note: Option<String>,
}

impl Validate for UpsertEntryRequest {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .max_len("note", self.note.as_deref(), MAX_DESCRIPTION_LEN)
            .finish()
    }
}
