//! Kongre API Library
//!
//! HTTP handlers, the submission intake pipeline, the organizer notifier, session relay
//! and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod utils;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, BucketStorage};
