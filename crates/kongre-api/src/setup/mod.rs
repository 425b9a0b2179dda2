//! Application setup and initialization
//!
//! Everything `main` needs to go from a validated `Config` to a running router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use kongre_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    kongre_infra::init_telemetry(config.server.log_json)
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.server.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let buckets = storage::setup_storage(&config).await?;
    let state = services::initialize_services(&config, pool, buckets).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
