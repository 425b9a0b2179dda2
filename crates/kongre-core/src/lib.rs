//! Kongre Core Library
//!
//! Domain models, error types, configuration and validation shared by the API,
//! the storage and database layers, and the submission client.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_path;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{
    AuthConfig, Config, DatabaseConfig, EmailConfig, RateLimitBackend, RateLimitConfig,
    ServerConfig, StorageConfig, SubmissionConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Degree, NewSubmission, Presentation, SessionResponse, SessionUser, SetSessionRequest,
    SubmissionPayload, SubmitResponse, Submission, UploadCategory, UploadCredential,
    UploadCredentialRequest,
};
pub use storage_path::{derive_upload_path, is_issued_path, slugify};
pub use storage_types::StorageBackend;
pub use validation::{InvalidField, ValidationRules};
