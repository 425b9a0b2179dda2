//! Kongre Database Library
//!
//! Persistence for submission records. The API depends on the repository traits so
//! handlers can be exercised against in-memory doubles.

pub mod db;

pub use db::{run_migrations, SubmissionRepository, SubmissionRepositoryTrait};
