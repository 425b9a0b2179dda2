//! Direct-to-store endpoint integration tests (local backend).
//!
//! Run with: `cargo test -p kongre-api --test storage_upload_test`

mod helpers;

use helpers::{put_upload, request_credential, setup_test_app, BASE_URL, MIME_PDF};
use serde_json::{json, Value};

#[tokio::test]
async fn test_upload_token_is_single_use() {
    let app = setup_test_app().await;
    let credential = request_credential(&app.server, "paper.pdf").await;

    let first = put_upload(&app.server, &credential, MIME_PDF, b"%PDF-1.7 first").await;
    assert_eq!(first.status_code(), 200, "{}", first.text());

    let second = put_upload(&app.server, &credential, MIME_PDF, b"%PDF-1.7 second").await;
    assert_eq!(second.status_code(), 401);
    assert_eq!(second.json::<Value>()["code"], "UNAUTHORIZED");

    // The first upload is what gets registered.
    let mut payload = helpers::valid_payload(&credential.path);
    payload["file_size"] = json!(b"%PDF-1.7 first".len());
    let response = app.server.post("/api/submit").json(&payload).await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
}

#[tokio::test]
async fn test_upload_rejects_other_content_type() {
    let app = setup_test_app().await;
    let credential = request_credential(&app.server, "paper.pdf").await;

    let response = put_upload(&app.server, &credential, "application/zip", b"PK\x03\x04").await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_upload_rejects_tampered_token() {
    let app = setup_test_app().await;
    let credential = request_credential(&app.server, "paper.pdf").await;
    let path = format!("/storage/upload/submissions/{}", credential.path);

    let response = app
        .server
        .put(&path)
        .add_query_param("token", "1.deadbeef")
        .content_type(MIME_PDF)
        .bytes(bytes::Bytes::from_static(b"%PDF"))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .server
        .put(&path)
        .content_type(MIME_PDF)
        .bytes(bytes::Bytes::from_static(b"%PDF"))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_signed_read_returns_uploaded_bytes() {
    let app = setup_test_app().await;
    let path = helpers::upload_paper(&app.server).await;

    app.server
        .post("/api/submit")
        .json(&helpers::valid_payload(&path))
        .await
        .assert_status_ok();

    let file_url = app.notifier.notices()[0].file_url.clone();
    let url = file_url.strip_prefix(BASE_URL).unwrap();
    let (object_path, token) = url.split_once("?token=").unwrap();

    let response = app
        .server
        .get(object_path)
        .add_query_param("token", token)
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.headers()["content-type"], MIME_PDF);
    assert_eq!(response.as_bytes().as_ref(), b"%PDF-1.7 test");

    let unsigned = app.server.get(object_path).await;
    assert_eq!(unsigned.status_code(), 401);
}

#[tokio::test]
async fn test_unknown_bucket_is_404() {
    let app = setup_test_app().await;

    let response = app
        .server
        .put("/storage/upload/elsewhere/2026-01-01/file.pdf")
        .add_query_param("token", "1.deadbeef")
        .content_type(MIME_PDF)
        .bytes(bytes::Bytes::from_static(b"%PDF"))
        .await;

    assert_eq!(response.status_code(), 404);
}
