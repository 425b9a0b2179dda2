#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use kongre_core::Config;
use std::sync::Arc;

/// Create the storage backend for one bucket based on configuration
pub async fn create_storage(config: &Config, bucket: &str) -> StorageResult<Arc<dyn Storage>> {
    let storage = &config.storage;

    match storage.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = storage.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

            let s3 = S3Storage::new(bucket.to_string(), region, storage.s3_endpoint.clone()).await?;
            Ok(Arc::new(s3))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = storage.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let secret = storage.signing_secret.clone().ok_or_else(|| {
                StorageError::ConfigError("STORAGE_SIGNING_SECRET not configured".to_string())
            })?;

            let local = LocalStorage::new(
                base_path,
                bucket,
                config.server.public_base_url.clone(),
                secret,
                storage.is_public(bucket),
            )
            .await?;
            Ok(Arc::new(local))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
