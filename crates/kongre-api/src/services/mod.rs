pub mod intake;
pub mod notifier;
pub mod upload_credentials;

pub use intake::IntakeService;
pub use notifier::{Notifier, NotifyError, SmtpNotifier, SubmissionNotice};
pub use upload_credentials::UploadCredentialIssuer;
