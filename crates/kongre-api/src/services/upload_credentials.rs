//! Issues one-time upload credentials.
//!
//! The service never receives the file bytes: it derives a fresh destination path and
//! asks the bucket's backend to authorize exactly one `PUT` of the declared type there.

use crate::state::BucketStorage;
use kongre_core::{
    derive_upload_path, AppError, UploadCategory, UploadCredential, UploadCredentialRequest,
};
use std::time::Duration;

#[derive(Clone)]
pub struct UploadCredentialIssuer {
    buckets: BucketStorage,
    ttl: Duration,
}

impl UploadCredentialIssuer {
    pub fn new(buckets: BucketStorage, ttl: Duration) -> Self {
        Self { buckets, ttl }
    }

    #[tracing::instrument(skip(self, request), fields(category = category.as_str()))]
    pub async fn issue(
        &self,
        category: UploadCategory,
        request: UploadCredentialRequest,
    ) -> Result<UploadCredential, AppError> {
        let filename = non_empty(request.filename)
            .ok_or_else(|| AppError::InvalidInput("filename is required".to_string()))?;
        let mime = non_empty(request.mime)
            .ok_or_else(|| AppError::InvalidInput("mime is required".to_string()))?;

        if !category.allows(&mime) {
            return Err(AppError::UnsupportedMediaType(
                category.rejection_message().to_string(),
            ));
        }

        let storage = self.buckets.for_category(category);
        let path = derive_upload_path(&filename);

        let signed = storage
            .presigned_put(&path, &mime, self.ttl)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = storage.bucket(), "Upload credential refused");
                AppError::Storage(format!("Could not issue upload credential: {}", e))
            })?;

        tracing::info!(bucket = storage.bucket(), path = %path, "Upload credential issued");

        Ok(UploadCredential {
            bucket: storage.bucket().to_string(),
            path,
            token: signed.token,
            upload_url: signed.url,
            expires_at: signed.expires_at,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kongre_core::is_issued_path;
    use kongre_core::models::upload::MIME_PDF;
    use kongre_storage::{LocalStorage, Storage};
    use std::sync::Arc;
    use tempfile::TempDir;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    async fn issuer(dir: &TempDir) -> UploadCredentialIssuer {
        let bucket = |name: &'static str| async move {
            Arc::new(
                LocalStorage::new(dir.path(), name, "http://localhost:4000", SECRET, false)
                    .await
                    .unwrap(),
            ) as Arc<dyn Storage>
        };
        let buckets = BucketStorage {
            submissions: bucket("submissions").await,
            past_papers: bucket("pastpapers").await,
            assets: bucket("assets").await,
        };
        UploadCredentialIssuer::new(buckets, Duration::from_secs(600))
    }

    fn request(filename: Option<&str>, mime: Option<&str>) -> UploadCredentialRequest {
        UploadCredentialRequest {
            filename: filename.map(String::from),
            mime: mime.map(String::from),
        }
    }

    #[tokio::test]
    async fn issues_credential_into_category_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(&dir).await;

        let credential = issuer
            .issue(
                UploadCategory::PastPaper,
                request(Some("Eski Bildiri.PDF"), Some(MIME_PDF)),
            )
            .await
            .unwrap();

        assert_eq!(credential.bucket, "pastpapers");
        assert!(is_issued_path(&credential.path));
        assert!(credential.path.ends_with("_eski-bildiri.pdf"));
        assert!(credential.upload_url.contains(&credential.token));
    }

    #[tokio::test]
    async fn missing_fields_are_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(&dir).await;

        let err = issuer
            .issue(UploadCategory::Submission, request(None, Some(MIME_PDF)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = issuer
            .issue(UploadCategory::Submission, request(Some("a.pdf"), Some("  ")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn category_allow_lists_are_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(&dir).await;

        let err = issuer
            .issue(UploadCategory::Asset, request(Some("paper.pdf"), Some(MIME_PDF)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));

        assert!(issuer
            .issue(UploadCategory::Asset, request(Some("logo.png"), Some("image/png")))
            .await
            .is_ok());
    }
}
