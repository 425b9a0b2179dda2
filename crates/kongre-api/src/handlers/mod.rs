pub mod auth_session;
pub mod health;
pub mod signed_upload;
pub mod storage_upload;
pub mod submit;
