//! Database setup and initialization

use anyhow::{Context, Result};
use kongre_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database connected successfully"
    );

    kongre_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
