//! Application state shared by all handlers.

use crate::auth::SessionManager;
use crate::services::{IntakeService, UploadCredentialIssuer};
use kongre_core::{Config, UploadCategory};
use kongre_db::SubmissionRepositoryTrait;
use kongre_infra::FixedWindowRateLimiter;
use kongre_storage::Storage;
use std::sync::Arc;

/// One storage instance per bucket the service writes to
#[derive(Clone)]
pub struct BucketStorage {
    pub submissions: Arc<dyn Storage>,
    pub past_papers: Arc<dyn Storage>,
    pub assets: Arc<dyn Storage>,
}

impl BucketStorage {
    pub fn for_category(&self, category: UploadCategory) -> &Arc<dyn Storage> {
        match category {
            UploadCategory::Submission => &self.submissions,
            UploadCategory::PastPaper => &self.past_papers,
            UploadCategory::Asset => &self.assets,
        }
    }

    /// Look up a bucket by name, as it appears in signed URLs
    pub fn by_name(&self, bucket: &str) -> Option<&Arc<dyn Storage>> {
        [&self.submissions, &self.past_papers, &self.assets]
            .into_iter()
            .find(|storage| storage.bucket() == bucket)
    }
}

pub struct AppState {
    pub config: Config,
    pub repository: Arc<dyn SubmissionRepositoryTrait>,
    pub buckets: BucketStorage,
    pub upload_issuer: UploadCredentialIssuer,
    pub intake: IntakeService,
    pub rate_limiter: FixedWindowRateLimiter,
    pub sessions: SessionManager,
}
