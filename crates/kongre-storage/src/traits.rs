//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use kongre_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("File not found: {}", key)),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired storage token".to_string())
            }
            StorageError::AlreadyExists(_) => {
                AppError::Unauthorized("Upload token has already been used".to_string())
            }
            StorageError::Unsupported(op) => {
                AppError::NotFound(format!("{} is not available", op))
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// A one-time write authorization issued by a backend
#[derive(Debug, Clone)]
pub struct SignedUpload {
    /// URL the client sends the bytes to with `PUT`
    pub url: String,
    /// Opaque token carried by the URL
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// An object read back through a signed or public link
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Storage abstraction trait
///
/// Each instance serves a single bucket. The application server never handles
/// uploaded bytes for S3: it only signs URLs. The local backend additionally redeems
/// its own signed URLs so the same flow works without S3.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket (or namespace) this instance writes to
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Authorize a `PUT` of `content_type` to `storage_key`.
    ///
    /// Local tokens are single use. S3 presigned URLs can be replayed until they
    /// expire, so intake compares the stored size with the declared one.
    async fn presigned_put(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUpload>;

    /// Generate a time-boxed URL for reading an object
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Permanent URL for objects in a publicly readable bucket
    fn public_url(&self, storage_key: &str) -> String;

    /// Size in bytes of a stored object, `None` when nothing is stored at the key
    async fn object_size(&self, storage_key: &str) -> StorageResult<Option<u64>>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.object_size(storage_key).await?.is_some())
    }

    /// Store the bytes of a signed upload. Only backends that serve their own upload
    /// URLs implement this.
    async fn redeem_signed_upload(
        &self,
        _storage_key: &str,
        _token: &str,
        _content_type: &str,
        _data: Bytes,
    ) -> StorageResult<()> {
        Err(StorageError::Unsupported("Direct upload endpoint"))
    }

    /// Read an object through a signed link (`token`) or, for public buckets, without one.
    async fn read_signed(
        &self,
        _storage_key: &str,
        _token: Option<&str>,
    ) -> StorageResult<StoredObject> {
        Err(StorageError::Unsupported("Object endpoint"))
    }
}

/// Validate an object key: relative, no empty, `.` or `..` segments, no backslashes.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.starts_with('/')
        || storage_key.contains('\\')
        || storage_key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
