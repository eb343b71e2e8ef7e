//! PostgreSQL pool setup and schema migrations

use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("DATABASE_URL is required for the postgres storage backend")]
    MissingUrl,

    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] MigrateError),
}

/// Connect a pool sized by `DB_MAX_CONNECTIONS`.
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    let database_url = config.database_url.as_deref().ok_or(DbError::MissingUrl)?;

    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
        .map_err(DbError::Connect)
}

/// Apply the embedded `migrations/` directory. Already-applied steps are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}
