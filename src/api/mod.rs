mod habits;
mod notes;
mod organizations;
mod pomodoro;
mod projects;
mod tasks;
mod users;

use axum::routing::{delete, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users", post(users::register))
        .route("/api/users/me", get(users::me))
        .route("/api/sessions", post(users::login))
        .route("/api/sessions/current", delete(users::logout))
        .route("/api/settings", get(users::get_settings).patch(users::patch_settings))
        .route(
            "/api/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/api/organizations/{id}",
            get(organizations::get_organization)
                .patch(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        .route("/api/organizations/{id}/projects", get(organizations::list_organization_projects))
        .route("/api/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/projects/{id}/move", post(projects::move_project))
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task).patch(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/tasks/{id}/subtasks", get(tasks::list_subtasks))
        .route("/api/tasks/{id}/move", post(tasks::move_task))
        .route("/api/habits", get(habits::list_habits).post(habits::create_habit))
        .route(
            "/api/habits/{id}",
            get(habits::get_habit).patch(habits::update_habit).delete(habits::delete_habit),
        )
        .route("/api/habits/{id}/toggle", post(habits::toggle_habit))
        .route("/api/habits/{id}/entries", get(habits::list_entries))
        .route("/api/habits/{id}/entries/{date}", put(habits::upsert_entry))
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/api/notes/{id}",
            get(notes::get_note).patch(notes::update_note).delete(notes::delete_note),
        )
        .route(
            "/api/pomodoro/sessions",
            get(pomodoro::list_sessions).post(pomodoro::start_session),
        )
        .route("/api/pomodoro/sessions/{id}/complete", post(pomodoro::complete_session))
        .route("/api/pomodoro/sessions/{id}/cancel", post(pomodoro::cancel_session))
        .route("/api/pomodoro/active", get(pomodoro::active_session))
        .route("/api/pomodoro/stats", get(pomodoro::stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
