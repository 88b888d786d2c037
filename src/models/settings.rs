use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation::{MAX_MINUTES, Rules, Validate};

/// Per-user preferences, stored as a JSON blob on the user row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub theme: String,
    pub week_starts_on: String,
    pub habit_window_days: u32,
    pub pomodoro: PomodoroSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PomodoroSettings {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub long_break_interval: u32,
    pub auto_start_breaks: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: "system".to_string(),
            week_starts_on: "monday".to_string(),
            habit_window_days: 30,
            pomodoro: PomodoroSettings::default(),
        }
    }
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_interval: 4,
            auto_start_breaks: false,
        }
    }
}

impl Validate for UserSettings {
    fn validate(&self) -> Result<(), AppError> {
        Rules::new()
            .one_of("theme", &self.theme, &["system", "light", "dark"])
            .one_of("week_starts_on", &self.week_starts_on, &["monday", "sunday"])
            .range("habit_window_days", Some(self.habit_window_days.into()), 1, 365)
            .range("pomodoro.focus_minutes", Some(self.pomodoro.focus_minutes.into()), 1, MAX_MINUTES)
            .range("pomodoro.short_break_minutes", Some(self.pomodoro.short_break_minutes.into()), 1, MAX_MINUTES)
            .range("pomodoro.long_break_minutes", Some(self.pomodoro.long_break_minutes.into()), 1, MAX_MINUTES)
            .range("pomodoro.long_break_interval", Some(self.pomodoro.long_break_interval.into()), 1, 12)
            .finish()
    }
}

/// Body of `PATCH /api/settings`: a JSON merge patch against [`UserSettings`].
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct SettingsPatch(pub serde_json::Value);

impl Validate for SettingsPatch {
    fn validate(&self) -> Result<(), AppError> {
        if self.0.is_object() {
            Ok(())
        } else {
            Err(AppError::validation("body", "settings patch must be a JSON object"))
        }
    }
}

/// RFC 7396 merge: objects merge key by key, `null` removes, anything else replaces.
pub fn merge_patch(target: &mut serde_json::Value, patch: &serde_json::Value) {
    match patch {
        serde_json::Value::Object(patch_map) => {
            if !target.is_object() {
                *target = serde_json::Value::Object(serde_json::Map::new());
            }
            if let Some(target_map) = target.as_object_mut() {
                for (key, value) in patch_map {
                    if value.is_null() {
                        target_map.remove(key);
                    } else {
                        merge_patch(target_map.entry(key.clone()).or_insert(serde_json::Value::Null), value);
                    }
                }
            }
        }
        other => *target = other.clone(),
    }
}
