pub mod habits;
pub mod notes;
pub mod organizations;
pub mod pomodoro;
pub mod projects;
pub mod tasks;
pub mod users;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let mut options = SqlitePoolOptions::new().max_connections(max_connections);
    // an in-memory database lives only as long as its connection
    if database_url.contains(":memory:") {
        options = options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = options.connect(database_url).await?;
    info!("connected to {}", database_url);
    Ok(pool)
}

pub async fn migrate(db: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(db).await
}

#[cfg(test)]
pub(crate) async fn setup_test_db() -> SqlitePool {
    let pool = connect("sqlite::memory:", 1)
        .await
        .expect("Failed to create test db");
    migrate(&pool).await.expect("Failed to run migrations");
    pool
}

#[cfg(test)]
pub(crate) async fn setup_test_user(db: &SqlitePool, email: &str) -> crate::models::User {
    users::insert_user(
        db,
        crate::models::NewUserRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
        },
    )
    .await
    .expect("Failed to insert user")
}
