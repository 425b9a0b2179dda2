//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use kongre_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kongre API",
        version = "0.1.0",
        description = "Paper submission service: upload credentials for direct-to-store uploads, submission intake with rate limiting and organizer notification, and session relay."
    ),
    paths(
        handlers::signed_upload::signed_upload,
        handlers::signed_upload::signed_upload_paper,
        handlers::signed_upload::signed_upload_asset,
        handlers::submit::submit,
        handlers::auth_session::set_session,
        handlers::auth_session::logout,
        handlers::auth_session::current_session,
        handlers::health::health_check,
    ),
    components(schemas(
        models::UploadCredentialRequest,
        models::UploadCredential,
        models::SubmissionPayload,
        models::SubmitResponse,
        models::SetSessionRequest,
        models::SessionResponse,
        models::SessionUser,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "uploads", description = "One-time upload credentials"),
        (name = "submissions", description = "Paper submission intake"),
        (name = "auth", description = "Session relay"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_public_endpoints() {
        let spec = ApiDoc::openapi();
        for path in [
            "/api/signed-upload",
            "/api/signed-upload-paper",
            "/api/signed-upload-asset",
            "/api/submit",
            "/api/auth/set",
            "/health",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
