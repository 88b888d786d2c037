pub mod habit;
pub mod note;
pub mod organization;
pub mod pomodoro;
pub mod project;
pub mod settings;
pub mod task;
pub mod user;

pub use habit::{Habit, HabitEntry, HabitFrequency, HabitStats, HabitWithStats, NewHabitRequest, ToggleEntryRequest, UpdateHabitRequest, UpsertEntryRequest};
pub use note::{NewNoteRequest, Note, UpdateNoteRequest};
pub use organization::{NewOrganizationRequest, Organization, OrganizationSummary, UpdateOrganizationRequest};
pub use pomodoro::{ActiveSession, PomodoroSession, SessionKind, SessionStatus, StartSessionRequest};
pub use project::{NewProjectRequest, Project, ProjectStatus, UpdateProjectRequest};
pub use settings::{PomodoroSettings, SettingsPatch, UserSettings};
pub use task::{NewTaskRequest, Task, TaskPriority, TaskStatus, UpdateTaskRequest};
pub use user::{NewSessionRequest, NewUserRequest, SessionResponse, User};

use serde::{Deserialize, Deserializer};

use crate::error::AppError;
use crate::validation::Validate;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in PATCH bodies.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Kanban move target shared by tasks and projects.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest<S> {
    pub status: S,
    pub index: usize,
}

impl<S> Validate for MoveRequest<S> {
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}
