//! Kongre Storage Library
//!
//! Storage abstraction for submission files and public assets, with an S3 backend for
//! production and a local filesystem backend for development and tests.
//!
//! # Object keys
//!
//! Keys are the paths issued with upload credentials (`{date}/{uuid}_{slug}.{ext}`),
//! relative to one bucket. Each `Storage` instance is bound to exactly one bucket.
//! Keys must not contain `..`, empty segments or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use kongre_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{SignedUpload, Storage, StorageError, StorageResult, StoredObject};
