pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod validation;

pub use api::router;
pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;
