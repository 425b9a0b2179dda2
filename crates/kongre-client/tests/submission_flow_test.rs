//! Client flow tests against a mocked API and store.

use kongre_client::{ClientError, PaperFile, SubmissionClient};
use kongre_core::SubmissionPayload;
use mockito::{Matcher, Server};
use serde_json::json;

const PATH: &str = "2026-10-18/0b6f2a3e-4f8c-4a57-9d1e-2b7c6a1f0e55_bildiri.pdf";
const MIME_PDF: &str = "application/pdf";

fn form() -> SubmissionPayload {
    SubmissionPayload {
        degree: Some("doktora".to_string()),
        full_name: Some("Mehmet Demir".to_string()),
        phone: None,
        email: Some("mehmet@example.edu.tr".to_string()),
        university: Some("Ege Üniversitesi".to_string()),
        title: Some("Kent Arşivlerinin Dijitalleşmesi".to_string()),
        presentation: Some("poster".to_string()),
        keywords: Some(vec!["arşiv".to_string(), "kent".to_string()]),
        summary: Some("Bu çalışma kent arşivlerinin dijitalleşme süreçlerini inceler.".to_string()),
        ..Default::default()
    }
}

fn paper() -> PaperFile {
    PaperFile::new("Bildiri.pdf", MIME_PDF, &b"%PDF-1.7 paper"[..])
}

fn credential_body(server_url: &str) -> serde_json::Value {
    json!({
        "bucket": "submissions",
        "path": PATH,
        "token": "1760000000.abc123",
        "upload_url": format!("{}/storage/upload/submissions/{}?token=1760000000.abc123", server_url, PATH),
        "expires_at": "2026-10-18T12:00:00Z",
    })
}

#[tokio::test]
async fn test_full_flow_uploads_then_submits() {
    let mut server = Server::new_async().await;

    let credential = server
        .mock("POST", "/api/signed-upload")
        .match_body(Matcher::PartialJson(json!({ "filename": "Bildiri.pdf", "mime": MIME_PDF })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(credential_body(&server.url()).to_string())
        .create_async()
        .await;
    let upload = server
        .mock("PUT", Matcher::Regex(r"^/storage/upload/submissions/".to_string()))
        .match_header("content-type", MIME_PDF)
        .match_body("%PDF-1.7 paper")
        .with_status(200)
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/api/submit")
        .match_body(Matcher::PartialJson(json!({
            "file_path": PATH,
            "file_name": "Bildiri.pdf",
            "file_mime": MIME_PDF,
            "file_size": 14,
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let client = SubmissionClient::new(server.url()).unwrap();
    let response = client.submit_paper(form(), paper()).await.unwrap();

    assert!(response.ok);
    credential.assert_async().await;
    upload.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_failed_upload_never_submits() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/api/signed-upload")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(credential_body(&server.url()).to_string())
        .create_async()
        .await;
    server
        .mock("PUT", Matcher::Regex(r"^/storage/upload/".to_string()))
        .with_status(403)
        .with_body("Request has expired")
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/api/submit")
        .expect(0)
        .create_async()
        .await;

    let client = SubmissionClient::new(server.url()).unwrap();
    let err = client.submit_paper(form(), paper()).await.unwrap_err();

    assert!(matches!(err, ClientError::Upload { status: 403, .. }));
    assert!(err.is_retryable());
    submit.assert_async().await;
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut payload = form();
    payload.keywords = Some(vec![]);

    let client = SubmissionClient::new(server.url()).unwrap();
    let err = client.submit_paper(payload, paper()).await.unwrap_err();

    assert!(matches!(err, ClientError::Invalid(_)));
    assert_eq!(err.field(), Some("keywords"));

    let zip = PaperFile::new("paper.zip", "application/zip", &b"PK"[..]);
    let err = client.submit_paper(form(), zip).await.unwrap_err();
    assert_eq!(err.field(), Some("file_mime"));

    any.assert_async().await;
}

#[tokio::test]
async fn test_rejected_credential_surfaces_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/signed-upload")
        .with_status(415)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": "Only PDF, DOC or DOCX files can be uploaded",
                "code": "UNSUPPORTED_MEDIA_TYPE",
                "recoverable": false,
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = SubmissionClient::new(server.url()).unwrap();
    let err = client
        .request_upload_credential(kongre_core::UploadCategory::Submission, "x.zip", "application/zip")
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, body } => {
            assert_eq!(status, 415);
            assert_eq!(body.code, "UNSUPPORTED_MEDIA_TYPE");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_submit_reports_retry_after() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/submit")
        .with_status(429)
        .with_header("retry-after", "37")
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Too many requests. Please slow down.","code":"RATE_LIMITED","recoverable":true}"#)
        .create_async()
        .await;

    let mut payload = form();
    payload.file_path = Some(PATH.to_string());

    let client = SubmissionClient::new(server.url()).unwrap();
    let err = client.submit(&payload).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::RateLimited {
            retry_after_secs: Some(37)
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_server_validation_error_names_field() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/submit")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":"file_path: no uploaded file found at this path","code":"VALIDATION_FAILED","recoverable":false,"field":"file_path"}"#,
        )
        .create_async()
        .await;

    let client = SubmissionClient::new(server.url()).unwrap();
    let err = client.submit(&form()).await.unwrap_err();

    assert_eq!(err.field(), Some("file_path"));
    assert!(!err.is_retryable());
}
