//! Storage setup: one backend instance per bucket

use crate::state::BucketStorage;
use anyhow::{Context, Result};
use kongre_core::Config;
use kongre_storage::create_storage;

pub async fn setup_storage(config: &Config) -> Result<BucketStorage> {
    tracing::info!(backend = %config.storage.backend, "Initializing storage...");
    let storage = &config.storage;

    let submissions = create_storage(config, &storage.submission_bucket)
        .await
        .context("Failed to initialize submission storage")?;
    let past_papers = create_storage(config, &storage.past_papers_bucket)
        .await
        .context("Failed to initialize past papers storage")?;
    let assets = create_storage(config, &storage.asset_bucket)
        .await
        .context("Failed to initialize asset storage")?;

    tracing::info!(
        submission_bucket = %storage.submission_bucket,
        past_papers_bucket = %storage.past_papers_bucket,
        asset_bucket = %storage.asset_bucket,
        public_buckets = %storage.public_buckets.join(","),
        "Storage initialized"
    );

    Ok(BucketStorage {
        submissions,
        past_papers,
        assets,
    })
}
