pub mod session;
pub mod submission;
pub mod upload;

pub use session::{SessionResponse, SessionUser, SetSessionRequest};
pub use submission::{
    Degree, NewSubmission, Presentation, Submission, SubmissionPayload, SubmitResponse,
};
pub use upload::{UploadCategory, UploadCredential, UploadCredentialRequest};
