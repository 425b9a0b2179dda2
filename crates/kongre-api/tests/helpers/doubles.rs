use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use kongre_api::services::{Notifier, NotifyError, SubmissionNotice};
use kongre_core::{AppError, NewSubmission, Submission};
use kongre_db::SubmissionRepositoryTrait;
use kongre_storage::{
    SignedUpload, Storage, StorageBackend, StorageError, StorageResult, StoredObject,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// In-memory submission store. With `failing` set every write errors like a dead pool.
pub struct MockRepository {
    rows: Mutex<Vec<Submission>>,
    failing: bool,
}

impl MockRepository {
    pub fn new(failing: bool) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            failing,
        }
    }

    pub fn rows(&self) -> Vec<Submission> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionRepositoryTrait for MockRepository {
    async fn insert(&self, submission: &NewSubmission) -> Result<Submission, AppError> {
        if self.failing {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let stored = Submission {
            id: Uuid::new_v4(),
            fields: submission.clone(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>, AppError> {
        Ok(self.rows().into_iter().find(|row| row.id == id))
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Records every notice; with `failing` set every delivery fails after recording.
pub struct RecordingNotifier {
    notices: Mutex<Vec<SubmissionNotice>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new(failing: bool) -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            failing,
        }
    }

    pub fn notices(&self) -> Vec<SubmissionNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_submission(&self, notice: &SubmissionNotice) -> Result<(), NotifyError> {
        self.notices.lock().unwrap().push(notice.clone());
        if self.failing {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Delegates to a real backend but cannot sign read URLs, like an S3 client whose
/// credentials stopped working after the upload.
pub struct UnsignableStorage {
    inner: Arc<dyn Storage>,
}

impl UnsignableStorage {
    pub fn wrap(inner: Arc<dyn Storage>) -> Arc<dyn Storage> {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl Storage for UnsignableStorage {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    async fn presigned_put(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUpload> {
        self.inner
            .presigned_put(storage_key, content_type, expires_in)
            .await
    }

    async fn get_presigned_url(
        &self,
        _storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::BackendError("signing credentials expired".to_string()))
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.inner.public_url(storage_key)
    }

    async fn object_size(&self, storage_key: &str) -> StorageResult<Option<u64>> {
        self.inner.object_size(storage_key).await
    }

    async fn redeem_signed_upload(
        &self,
        storage_key: &str,
        token: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        self.inner
            .redeem_signed_upload(storage_key, token, content_type, data)
            .await
    }

    async fn read_signed(
        &self,
        storage_key: &str,
        token: Option<&str>,
    ) -> StorageResult<StoredObject> {
        self.inner.read_signed(storage_key, token).await
    }
}
