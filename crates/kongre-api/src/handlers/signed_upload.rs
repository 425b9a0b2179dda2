use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use kongre_core::{UploadCategory, UploadCredential, UploadCredentialRequest};
use std::sync::Arc;

async fn issue(
    state: &AppState,
    category: UploadCategory,
    request: UploadCredentialRequest,
) -> Result<Json<UploadCredential>, HttpAppError> {
    let credential = state.upload_issuer.issue(category, request).await?;
    Ok(Json(credential))
}

/// Issue an upload credential for a submission paper (PDF, DOC, DOCX)
#[utoipa::path(
    post,
    path = "/api/signed-upload",
    tag = "uploads",
    request_body = UploadCredentialRequest,
    responses(
        (status = 200, description = "Upload credential issued", body = UploadCredential),
        (status = 400, description = "filename or mime missing", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse),
        (status = 500, description = "Storage backend refused", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "signed_upload"))]
pub async fn signed_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadCredentialRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    issue(&state, UploadCategory::Submission, request).await
}

/// Issue an upload credential for the past-papers archive
#[utoipa::path(
    post,
    path = "/api/signed-upload-paper",
    tag = "uploads",
    request_body = UploadCredentialRequest,
    responses(
        (status = 200, description = "Upload credential issued", body = UploadCredential),
        (status = 400, description = "filename or mime missing", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse),
        (status = 500, description = "Storage backend refused", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "signed_upload_paper"))]
pub async fn signed_upload_paper(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadCredentialRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    issue(&state, UploadCategory::PastPaper, request).await
}

/// Issue an upload credential for an image asset (JPEG, PNG, WEBP)
#[utoipa::path(
    post,
    path = "/api/signed-upload-asset",
    tag = "uploads",
    request_body = UploadCredentialRequest,
    responses(
        (status = 200, description = "Upload credential issued", body = UploadCredential),
        (status = 400, description = "filename or mime missing", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse),
        (status = 500, description = "Storage backend refused", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "signed_upload_asset"))]
pub async fn signed_upload_asset(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadCredentialRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    issue(&state, UploadCategory::Asset, request).await
}
