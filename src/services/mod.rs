pub mod habit_stats;
pub mod kanban;
pub mod pomodoro;
pub mod scheduler;

pub use kanban::{Board, KanbanError, Placement};
pub use scheduler::SessionSweeper;
