use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Tokens handed over by the browser after it signs in with the auth provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SetSessionRequest {
    #[validate(length(min = 1, message = "access_token must not be empty"))]
    pub access_token: String,
    #[validate(length(min = 1, message = "refresh_token must not be empty"))]
    pub refresh_token: String,
}

/// The signed-in user as seen by server-side handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
}
