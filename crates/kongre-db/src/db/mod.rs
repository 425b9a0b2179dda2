//! Database repositories for data access layer
//
// Submission records
pub mod submission;

pub use submission::{SubmissionRepository, SubmissionRepositoryTrait};

use anyhow::Context;
use sqlx::PgPool;
use std::path::Path;

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}
