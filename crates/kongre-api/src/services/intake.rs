//! Submission intake pipeline
//!
//! Validation, the stored-file check and the insert are hard gates: any failure aborts
//! with nothing written. The insert is the point of no return. Resolving the file URL
//! and notifying the organizer happen afterwards and never fail the request; their
//! failures are logged with `degraded_delivery = true`.

use crate::services::notifier::{Notifier, SubmissionNotice};
use kongre_core::{
    is_issued_path, AppError, InvalidField, NewSubmission, Submission, SubmissionPayload,
    ValidationRules,
};
use kongre_db::SubmissionRepositoryTrait;
use kongre_storage::Storage;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct IntakeService {
    rules: ValidationRules,
    repository: Arc<dyn SubmissionRepositoryTrait>,
    storage: Arc<dyn Storage>,
    public_bucket: bool,
    file_url_ttl: Duration,
    notifier: Option<Arc<dyn Notifier>>,
}

impl IntakeService {
    pub fn new(
        rules: ValidationRules,
        repository: Arc<dyn SubmissionRepositoryTrait>,
        storage: Arc<dyn Storage>,
        public_bucket: bool,
        file_url_ttl: Duration,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            rules,
            repository,
            storage,
            public_bucket,
            file_url_ttl,
            notifier,
        }
    }

    /// Validate, persist and announce one submission.
    ///
    /// Rate limiting happens before this is called.
    #[tracing::instrument(skip(self, payload, user_agent), fields(ip = ?ip))]
    pub async fn submit(
        &self,
        payload: SubmissionPayload,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Submission, AppError> {
        let submission = self.rules.into_new_submission(payload, ip, user_agent)?;
        self.ensure_uploaded(&submission).await?;

        let stored = self.repository.insert(&submission).await?;
        tracing::info!(submission_id = %stored.id, "Submission accepted");

        let file_url = self.resolve_file_url(&stored).await;
        self.notify(&stored, file_url).await;

        Ok(stored)
    }

    /// The path must be one we issued, the upload must have completed, and the stored
    /// object must be the size the submitter declared.
    async fn ensure_uploaded(&self, submission: &NewSubmission) -> Result<(), AppError> {
        let file_path = &submission.file_path;
        if !is_issued_path(file_path) {
            return Err(InvalidField::new("file_path", "was not issued by this service").into());
        }
        let size = self.storage.object_size(file_path).await.map_err(|e| {
            AppError::Storage(format!("Could not verify uploaded file: {}", e))
        })?;
        let Some(size) = size else {
            return Err(InvalidField::new("file_path", "no uploaded file found at this path").into());
        };
        if i64::try_from(size).ok() != Some(submission.file_size) {
            tracing::warn!(
                path = %file_path,
                stored_bytes = size,
                declared_bytes = submission.file_size,
                "Stored file size does not match submission"
            );
            return Err(InvalidField::new("file_size", "does not match the uploaded file").into());
        }
        Ok(())
    }

    /// Signed URL for private buckets, permanent URL otherwise. Signing failures fall
    /// back to the permanent URL.
    async fn resolve_file_url(&self, submission: &Submission) -> String {
        let path = &submission.fields.file_path;
        if self.public_bucket {
            return self.storage.public_url(path);
        }
        match self.storage.get_presigned_url(path, self.file_url_ttl).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    degraded_delivery = true,
                    submission_id = %submission.id,
                    error = %e,
                    "Could not sign file URL, using public URL"
                );
                self.storage.public_url(path)
            }
        }
    }

    async fn notify(&self, submission: &Submission, file_url: String) {
        let Some(notifier) = &self.notifier else {
            tracing::debug!(submission_id = %submission.id, "Notifications disabled");
            return;
        };

        let fields = &submission.fields;
        let notice = SubmissionNotice {
            submission_id: submission.id,
            full_name: fields.full_name.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            university: fields.university.clone(),
            title: fields.title.clone(),
            file_url,
            ip: fields.ip.clone(),
            user_agent: fields.user_agent.clone(),
        };

        if let Err(e) = notifier.notify_submission(&notice).await {
            tracing::warn!(
                degraded_delivery = true,
                submission_id = %submission.id,
                error = %e,
                "Organizer notification failed"
            );
        }
    }
}
