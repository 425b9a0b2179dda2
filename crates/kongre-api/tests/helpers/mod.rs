//! Test helpers: the real router over in-memory collaborators.
//!
//! Storage is the local backend in a temporary directory; the repository, notifier and
//! rate-limit store are in-process doubles, so these tests need neither Docker nor
//! network access.

#![allow(dead_code)]

pub mod doubles;

use axum_test::TestServer;
use bytes::Bytes;
use kongre_api::services::Notifier;
use kongre_api::setup::{routes, services, storage};
use kongre_core::{Config, UploadCredential};
use kongre_infra::MemoryRateLimitStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

pub use doubles::{MockRepository, RecordingNotifier, UnsignableStorage};

pub const JWT_SECRET: &str = "fedcba9876543210fedcba9876543210";
pub const BASE_URL: &str = "http://localhost:4000";
pub const MIME_PDF: &str = "application/pdf";

pub struct TestApp {
    pub server: TestServer,
    pub repository: Arc<MockRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub _temp_dir: TempDir,
}

/// Knobs for the few tests that need a non-default setup
#[derive(Default)]
pub struct TestOptions {
    pub failing_notifier: bool,
    pub failing_repository: bool,
    pub public_submissions: bool,
    pub failing_url_signing: bool,
    pub extra_env: Vec<(&'static str, String)>,
}

pub fn test_config(storage_path: &str, options: &TestOptions) -> Config {
    let mut vars: HashMap<&'static str, String> = HashMap::from([
        ("DATABASE_URL", "postgres://localhost/kongre_test".to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", storage_path.to_string()),
        (
            "STORAGE_SIGNING_SECRET",
            "0123456789abcdef0123456789abcdef".to_string(),
        ),
        ("SUBMISSION_BUCKET", "submissions".to_string()),
        ("PUBLIC_BASE_URL", BASE_URL.to_string()),
        ("RATE_LIMIT_BACKEND", "memory".to_string()),
        ("RATE_LIMIT_MAX_REQUESTS", "5".to_string()),
        ("RATE_LIMIT_WINDOW_SECS", "60".to_string()),
        ("AUTH_JWT_SECRET", JWT_SECRET.to_string()),
        ("MAX_PAPER_SIZE_MB", "1".to_string()),
    ]);
    if options.public_submissions {
        vars.insert("STORAGE_PUBLIC_BUCKETS", "submissions".to_string());
    }
    for (key, value) in &options.extra_env {
        vars.insert(*key, value.clone());
    }
    Config::from_source(|key| vars.get(key).cloned()).expect("test config")
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(&temp_dir.path().to_string_lossy(), &options);

    let repository = Arc::new(MockRepository::new(options.failing_repository));
    let notifier = Arc::new(RecordingNotifier::new(options.failing_notifier));
    let mut buckets = storage::setup_storage(&config)
        .await
        .expect("Failed to create local storage");
    if options.failing_url_signing {
        buckets.submissions = UnsignableStorage::wrap(buckets.submissions);
    }

    let state = services::build_state(
        config.clone(),
        repository.clone(),
        buckets,
        Arc::new(MemoryRateLimitStore::new()),
        Some(notifier.clone() as Arc<dyn Notifier>),
    );
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        repository,
        notifier,
        _temp_dir: temp_dir,
    }
}

/// Request a credential for a paper upload
pub async fn request_credential(server: &TestServer, filename: &str) -> UploadCredential {
    let response = server
        .post("/api/signed-upload")
        .json(&json!({ "filename": filename, "mime": MIME_PDF }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json::<UploadCredential>()
}

/// `PUT` bytes to a credential's upload URL, as a browser would
pub async fn put_upload(
    server: &TestServer,
    credential: &UploadCredential,
    content_type: &str,
    data: &'static [u8],
) -> axum_test::TestResponse {
    let url = credential
        .upload_url
        .strip_prefix(BASE_URL)
        .expect("upload URL points at this service");
    let (path, token) = url.split_once("?token=").expect("upload URL carries a token");
    server
        .put(path)
        .add_query_param("token", token)
        .content_type(content_type)
        .bytes(Bytes::from_static(data))
        .await
}

/// Credential plus completed upload; returns the issued path
pub async fn upload_paper(server: &TestServer) -> String {
    let credential = request_credential(server, "Bildiri Metni.pdf").await;
    let response = put_upload(server, &credential, MIME_PDF, b"%PDF-1.7 test").await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    credential.path
}

pub fn words(n: usize) -> String {
    vec!["kelime"; n].join(" ")
}

/// A payload that passes every validation rule
pub fn valid_payload(file_path: &str) -> Value {
    json!({
        "degree": "lisans",
        "full_name": "Ayşe Yılmaz",
        "phone": "+90 532 123 45 67",
        "email": "ayse@example.edu.tr",
        "university": "Ankara Üniversitesi",
        "title": "Dijital Arşivlerde Üstveri",
        "presentation": "sozlu",
        "keywords": ["a"],
        "summary": words(10),
        "file_name": "Bildiri Metni.pdf",
        "file_mime": MIME_PDF,
        "file_size": 13,
        "file_path": file_path,
    })
}
