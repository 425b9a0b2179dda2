//! HTTP client for the Kongre submission flow.
//!
//! A paper is submitted in three steps: request an upload credential, `PUT` the file
//! straight to the store with it, then register the metadata with `/api/submit`.
//! [`SubmissionClient::submit_paper`] runs all three and stops at the first failure,
//! so a failed upload never produces a submission.

pub mod error;

pub use error::{ApiErrorBody, ClientError};

use bytes::Bytes;
use kongre_core::config::MAX_PAPER_SIZE_MB;
use kongre_core::{
    derive_upload_path, SubmissionPayload, SubmitResponse, UploadCategory, UploadCredential,
    UploadCredentialRequest, ValidationRules,
};
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// A file held in memory, ready for direct upload
#[derive(Debug, Clone)]
pub struct PaperFile {
    pub name: String,
    pub mime: String,
    pub data: Bytes,
}

impl PaperFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }
}

fn credential_path(category: UploadCategory) -> &'static str {
    match category {
        UploadCategory::Submission => "/api/signed-upload",
        UploadCategory::PastPaper => "/api/signed-upload-paper",
        UploadCategory::Asset => "/api/signed-upload-asset",
    }
}

#[derive(Clone, Debug)]
pub struct SubmissionClient {
    client: Client,
    base_url: String,
    rules: ValidationRules,
}

impl SubmissionClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        let base_url = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rules: ValidationRules::new(MAX_PAPER_SIZE_MB * 1024 * 1024),
        })
    }

    /// Create a client for `KONGRE_API_URL` (default `http://localhost:4000`).
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url =
            std::env::var("KONGRE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Match the server's `MAX_PAPER_SIZE_MB` when it differs from the default.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.rules = ValidationRules::new(bytes);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(self.build_url(path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Ask the API for a one-time credential to upload `filename` into `category`.
    pub async fn request_upload_credential(
        &self,
        category: UploadCategory,
        filename: &str,
        mime: &str,
    ) -> Result<UploadCredential, ClientError> {
        let request = UploadCredentialRequest {
            filename: Some(filename.to_string()),
            mime: Some(mime.to_string()),
        };
        self.post_json(credential_path(category), &request).await
    }

    /// Send the file bytes straight to the store with a credential.
    ///
    /// The bytes never pass through the API; `upload_url` points at the store (or at
    /// the API's local storage endpoint in development).
    pub async fn upload(
        &self,
        credential: &UploadCredential,
        mime: &str,
        data: Bytes,
    ) -> Result<(), ClientError> {
        let size = data.len();
        let response = self
            .client
            .put(&credential.upload_url)
            .header(header::CONTENT_TYPE, mime)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), path = %credential.path, "Direct upload rejected");
            return Err(ClientError::Upload {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(path = %credential.path, size_bytes = size, "Direct upload complete");
        Ok(())
    }

    /// Register an already uploaded paper.
    pub async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitResponse, ClientError> {
        self.post_json("/api/submit", payload).await
    }

    /// Validate, upload and register a paper.
    ///
    /// `payload`'s file fields are filled in from `file`. Nothing is sent when the
    /// form fails validation, and `/api/submit` is not called when the upload fails.
    pub async fn submit_paper(
        &self,
        mut payload: SubmissionPayload,
        file: PaperFile,
    ) -> Result<SubmitResponse, ClientError> {
        payload.file_name = Some(file.name.clone());
        payload.file_mime = Some(file.mime.clone());
        payload.file_size = Some(file.data.len() as i64);
        // Stand-in with the issued shape until the real path is known.
        payload.file_path = Some(derive_upload_path(&file.name));
        self.rules.validate(&payload)?;

        let credential = self
            .request_upload_credential(UploadCategory::Submission, &file.name, &file.mime)
            .await?;
        self.upload(&credential, &file.mime, file.data).await?;

        payload.file_path = Some(credential.path);
        self.submit(&payload).await
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());
        return ClientError::RateLimited { retry_after_secs };
    }

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return ClientError::Transport(e),
    };
    match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            body,
        },
        Err(_) => ClientError::UnexpectedResponse(format!("{}: {}", status, text)),
    }
}
