use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://beaver_task.db?mode=rwc".to_string());

        Ok(Self {
            database_url,
            bind_addr: parse_var("BIND_ADDR", "127.0.0.1:3000")?,
            max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,
            sweep_interval_secs: parse_var("POMODORO_SWEEP_INTERVAL_SECS", "30")?,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", name, raw)))
}
