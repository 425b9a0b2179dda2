use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const DOCUMENT_TYPES: &[&str] = &[MIME_PDF, MIME_DOC, MIME_DOCX];
const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Content category an upload credential is issued for. Each category has its own
/// allow-list and destination bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    /// Papers attached to a submission
    Submission,
    /// Documents for the past-papers archive
    PastPaper,
    /// Images used on public pages
    Asset,
}

impl UploadCategory {
    pub fn allowed_mime_types(&self) -> &'static [&'static str] {
        match self {
            UploadCategory::Submission | UploadCategory::PastPaper => DOCUMENT_TYPES,
            UploadCategory::Asset => IMAGE_TYPES,
        }
    }

    pub fn allows(&self, mime: &str) -> bool {
        self.allowed_mime_types().contains(&mime)
    }

    /// Message shown when a file type is rejected
    pub fn rejection_message(&self) -> &'static str {
        match self {
            UploadCategory::Submission | UploadCategory::PastPaper => {
                "Only PDF, DOC or DOCX files can be uploaded"
            }
            UploadCategory::Asset => "Only JPG, PNG or WEBP images can be uploaded",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadCategory::Submission => "submission",
            UploadCategory::PastPaper => "past_paper",
            UploadCategory::Asset => "asset",
        }
    }
}

/// Request for a one-time upload credential
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UploadCredentialRequest {
    /// Original file name, used only to derive a safe destination path
    pub filename: Option<String>,
    /// MIME type of the file to be uploaded
    pub mime: Option<String>,
}

/// A time-boxed authorization to write exactly one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadCredential {
    pub bucket: String,
    /// Destination path, to be sent back as `file_path` on submission
    pub path: String,
    /// Opaque token proving the authorization
    pub token: String,
    /// URL to `PUT` the file bytes to
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_categories_accept_only_office_and_pdf() {
        for category in [UploadCategory::Submission, UploadCategory::PastPaper] {
            assert!(category.allows(MIME_PDF));
            assert!(category.allows(MIME_DOC));
            assert!(category.allows(MIME_DOCX));
            assert!(!category.allows("application/zip"));
            assert!(!category.allows("image/png"));
        }
    }

    #[test]
    fn asset_category_accepts_images() {
        assert!(UploadCategory::Asset.allows("image/webp"));
        assert!(!UploadCategory::Asset.allows("image/gif"));
        assert!(!UploadCategory::Asset.allows(MIME_PDF));
    }
}
