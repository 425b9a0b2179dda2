//! Service wiring

use crate::auth::SessionManager;
use crate::constants::RATE_LIMIT_CLEANUP_INTERVAL_SECS;
use crate::services::{IntakeService, Notifier, SmtpNotifier, UploadCredentialIssuer};
use crate::state::{AppState, BucketStorage};
use anyhow::{Context, Result};
use kongre_core::{Config, RateLimitBackend, ValidationRules};
use kongre_db::{SubmissionRepository, SubmissionRepositoryTrait};
use kongre_infra::{
    FixedWindowRateLimiter, MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Initialize all services and repositories from configuration
pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    buckets: BucketStorage,
) -> Result<Arc<AppState>> {
    let repository: Arc<dyn SubmissionRepositoryTrait> = Arc::new(SubmissionRepository::new(pool));
    let rate_limit_store = setup_rate_limit_store(config).await?;
    let notifier = SmtpNotifier::from_config(&config.email)
        .context("Failed to initialize submission notifier")?
        .map(|notifier| Arc::new(notifier) as Arc<dyn Notifier>);

    Ok(build_state(
        config.clone(),
        repository,
        buckets,
        rate_limit_store,
        notifier,
    ))
}

/// Assemble the application state from its collaborators
pub fn build_state(
    config: Config,
    repository: Arc<dyn SubmissionRepositoryTrait>,
    buckets: BucketStorage,
    rate_limit_store: Arc<dyn RateLimitStore>,
    notifier: Option<Arc<dyn Notifier>>,
) -> Arc<AppState> {
    let storage = &config.storage;

    let upload_issuer = UploadCredentialIssuer::new(
        buckets.clone(),
        Duration::from_secs(storage.upload_url_ttl_secs),
    );
    let intake = IntakeService::new(
        ValidationRules::new(config.submission.max_paper_size_bytes),
        repository.clone(),
        buckets.submissions.clone(),
        storage.is_public(&storage.submission_bucket),
        Duration::from_secs(storage.file_url_ttl_secs),
        notifier,
    );
    let rate_limiter = FixedWindowRateLimiter::new(
        rate_limit_store,
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    );
    let sessions = SessionManager::new(&config.auth, config.is_production());

    Arc::new(AppState {
        config,
        repository,
        buckets,
        upload_issuer,
        intake,
        rate_limiter,
        sessions,
    })
}

async fn setup_rate_limit_store(config: &Config) -> Result<Arc<dyn RateLimitStore>> {
    let rate_limit = &config.rate_limit;
    match rate_limit.backend {
        RateLimitBackend::Redis => {
            let url = rate_limit
                .redis_url
                .as_deref()
                .context("REDIS_URL must be set for the redis rate limit backend")?;
            let store = RedisRateLimitStore::connect(url, &rate_limit.key_prefix)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Rate limiting backed by Redis");
            Ok(Arc::new(store))
        }
        RateLimitBackend::Memory => {
            tracing::warn!(
                "Rate limiting uses process memory; limits are not shared between instances"
            );
            let store = Arc::new(MemoryRateLimitStore::new());
            spawn_cleanup_task(store.clone());
            Ok(store)
        }
    }
}

/// Periodically drop expired in-memory windows
fn spawn_cleanup_task(store: Arc<MemoryRateLimitStore>) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(RATE_LIMIT_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            store.cleanup_expired_buckets().await;
        }
    });
}
