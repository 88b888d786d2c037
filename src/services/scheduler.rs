use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db::pomodoro as repository;
use crate::error::AppError;
use crate::models::SessionStatus;
use crate::services::pomodoro::{is_expired, planned_end};

/// Completes Pomodoro sessions whose countdown ran out while no client was
/// around to report it.
pub struct SessionSweeper {
    db: SqlitePool,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(db: SqlitePool, interval_secs: u64) -> Self {
        Self {
            db,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Sweeps forever on a fixed interval.
    pub async fn start(self) {
        info!("Starting pomodoro sweeper (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.sweep_once().await {
                Ok(0) => debug!("Pomodoro sweep found no expired sessions"),
                Ok(count) => info!("Pomodoro sweep completed {} expired sessions", count),
                Err(e) => {
                    warn!("Pomodoro sweep failed: {:?}", e);
                }
            }
        }
    }

    /// Marks every expired running session completed at its planned end.
    pub async fn sweep_once(&self) -> Result<usize, AppError> {
        let now = Utc::now();
        let mut completed = 0;
        for session in repository::fetch_all_running(&self.db).await? {
            if !is_expired(&session, now) {
                continue;
            }
            let finished = repository::finish_session(
                &self.db,
                &session.user_id,
                &session.id,
                SessionStatus::Completed,
                planned_end(&session),
            )
            .await;
            match finished {
                Ok(Some(_)) => completed += 1,
                Ok(None) => {}
                Err(e) => warn!("Failed to complete pomodoro session {}: {:?}", session.id, e),
            }
        }
        Ok(completed)
    }
}
